//! Entity 定義

pub mod connection;
pub mod event;
pub mod room;

pub use connection::{
    Connection, ConnectionState, OutboundReceiver, OutboundSender, outbound_channel,
};
pub use event::{Event, EventTarget, InboundEvent};
pub use room::{RoomMember, RoomSnapshot};
