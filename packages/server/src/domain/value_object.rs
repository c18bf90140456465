//! Value Object 定義
//!
//! 識別子やイベント名など、生成時にバリデーションを行う不変の値を定義します。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// RoomId の最大文字数
pub const MAX_ROOM_ID_LENGTH: usize = 64;

/// EventName の最大文字数
pub const MAX_EVENT_NAME_LENGTH: usize = 128;

/// 接続 ID（トランスポートのセッションごとに一意）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::ConnectionIdEmpty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

/// ルーム ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// 前後の空白は取り除かれます。空文字列と最大長超過はエラー。
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::RoomIdEmpty);
        }
        let length = trimmed.chars().count();
        if length > MAX_ROOM_ID_LENGTH {
            return Err(ValueObjectError::RoomIdTooLong {
                max: MAX_ROOM_ID_LENGTH,
                actual: length,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// イベント名
///
/// 大文字小文字を区別する任意の文字列。`connect` / `disconnect` / `message` /
/// `join` / `leave` は組み込みイベントとして扱われます。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventName(String);

impl EventName {
    pub const CONNECT: &'static str = "connect";
    pub const DISCONNECT: &'static str = "disconnect";
    pub const MESSAGE: &'static str = "message";
    pub const JOIN: &'static str = "join";
    pub const LEAVE: &'static str = "leave";

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() || value.trim() != value {
            return Err(ValueObjectError::EventNameInvalid(value));
        }
        let length = value.chars().count();
        if length > MAX_EVENT_NAME_LENGTH {
            return Err(ValueObjectError::EventNameTooLong {
                max: MAX_EVENT_NAME_LENGTH,
                actual: length,
            });
        }
        Ok(Self(value))
    }

    /// コード中のリテラル（組み込みイベント名など）から生成
    pub(crate) fn from_static(value: &'static str) -> Self {
        debug_assert!(Self::new(value.to_string()).is_ok());
        Self(value.to_string())
    }

    pub fn connect() -> Self {
        Self::from_static(Self::CONNECT)
    }

    pub fn disconnect() -> Self {
        Self::from_static(Self::DISCONNECT)
    }

    pub fn message() -> Self {
        Self::from_static(Self::MESSAGE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// サーバー側で意味を持つ組み込みイベントかどうか
    pub fn is_reserved(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::CONNECT | Self::DISCONNECT | Self::JOIN | Self::LEAVE
        )
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

macro_rules! impl_string_value_object {
    ($($ty:ident),+) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = ValueObjectError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.0
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

impl_string_value_object!(ConnectionId, RoomId, EventName);
