//! UseCase 層
//!
//! 接続のライフサイクル（open / dispatch / close）と、HTTP API 向けの
//! 読み取り系ユースケースを提供します。

mod close_session;
mod dispatch_event;
mod error;
mod get_room_detail;
mod get_rooms;
mod get_stats;
mod open_session;
mod presence;
#[cfg(test)]
pub(crate) mod testing;

pub use close_session::{CloseReason, CloseSessionUseCase};
pub use dispatch_event::{DispatchEventUseCase, DispatchOutcome};
pub use error::{DispatchError, GetRoomDetailError, OpenSessionError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use get_stats::{GetStatsUseCase, ServerStats};
pub use open_session::OpenSessionUseCase;
pub use presence::PresenceNotifier;
