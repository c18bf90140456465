//! UseCase: サーバー統計取得

use std::sync::Arc;

use crate::domain::{RoomRegistry, SessionCounter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerStats {
    pub open_connections: usize,
    pub rooms: usize,
}

/// サーバー統計取得のユースケース
pub struct GetStatsUseCase {
    registry: Arc<dyn RoomRegistry>,
    counter: Arc<SessionCounter>,
}

impl GetStatsUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>, counter: Arc<SessionCounter>) -> Self {
        Self { registry, counter }
    }

    pub async fn execute(&self) -> ServerStats {
        ServerStats {
            open_connections: self.counter.current(),
            rooms: self.registry.rooms().await.len(),
        }
    }
}
