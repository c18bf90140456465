//! UseCase: ルーム一覧取得

use std::sync::Arc;

use crate::domain::{RoomRegistry, RoomSnapshot};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ルーム ID 順のスナップショット一覧
    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        self.registry.rooms().await
    }
}
