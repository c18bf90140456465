//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::ConnectionId;

/// 接続開始時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenSessionError {
    #[error("connection id '{0}' is already in use")]
    DuplicateConnectionId(ConnectionId),
}

/// 受信イベント処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("connection '{0}' is not open")]
    ConnectionNotOpen(ConnectionId),

    /// クライアントから送ることのできない予約済みイベント名
    #[error("event name '{0}' is reserved")]
    ReservedEvent(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// ルーム詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}
