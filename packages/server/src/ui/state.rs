//! Shared application state.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::usecase::{
    CloseSessionUseCase, DispatchEventUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
    GetStatsUseCase, OpenSessionUseCase,
};

/// ハンドラから参照するアプリケーション状態
pub struct AppState {
    pub open_session_usecase: Arc<OpenSessionUseCase>,
    pub close_session_usecase: Arc<CloseSessionUseCase>,
    pub dispatch_event_usecase: Arc<DispatchEventUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    pub get_stats_usecase: Arc<GetStatsUseCase>,
    /// キャンセルされると、開いている全接続を `server-shutdown` で閉じる
    pub shutdown: CancellationToken,
}
