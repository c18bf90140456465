//! UseCase: ルーム詳細取得

use std::sync::Arc;

use crate::domain::{RoomId, RoomRegistry, RoomSnapshot};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ルーム詳細を取得
    ///
    /// 不正な形式の ID も「存在しないルーム」として扱う。
    pub async fn execute(&self, room_id: String) -> Result<RoomSnapshot, GetRoomDetailError> {
        let room_id = RoomId::new(room_id).map_err(|_| GetRoomDetailError::RoomNotFound)?;
        self.registry
            .room(&room_id)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound)
    }
}
