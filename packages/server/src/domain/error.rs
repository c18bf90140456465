//! ドメイン層のエラー型

use thiserror::Error;

use super::value_object::ConnectionId;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("connection id must not be empty")]
    ConnectionIdEmpty,

    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("room id is too long ({actual} > {max} characters)")]
    RoomIdTooLong { max: usize, actual: usize },

    #[error("invalid event name '{0}'")]
    EventNameInvalid(String),

    #[error("event name is too long ({actual} > {max} characters)")]
    EventNameTooLong { max: usize, actual: usize },
}

/// 接続への送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// 接続が既に閉じている（送信は破棄される）
    #[error("connection '{0}' is closed")]
    ConnectionClosed(ConnectionId),
}
