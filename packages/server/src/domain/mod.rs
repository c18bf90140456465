//! Domain layer: connection, room and event model plus the interfaces the
//! infrastructure layer implements.

pub mod emitter;
pub mod entity;
pub mod error;
pub mod factory;
pub mod registry;
pub mod session;
pub mod value_object;

pub use emitter::{EventDispatcher, EventEmitter, EventHandler, EventScope};
pub use entity::{
    Connection, ConnectionState, Event, EventTarget, InboundEvent, OutboundReceiver,
    OutboundSender, RoomMember, RoomSnapshot, outbound_channel,
};
pub use error::{ConnectionError, ValueObjectError};
pub use factory::ConnectionIdFactory;
pub use registry::RoomRegistry;
pub use session::SessionCounter;
pub use value_object::{ConnectionId, EventName, RoomId, Timestamp};
