//! Event エンティティ
//!
//! 名前とペイロードの組。生成 → 配信 → 破棄される一時的な値で、永続化はしない。

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::{
    emitter::EventScope,
    error::ValueObjectError,
    value_object::{ConnectionId, EventName, RoomId},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: EventName,
    pub payload: Value,
}

impl Event {
    pub fn new(name: EventName, payload: Value) -> Self {
        Self { name, payload }
    }

    /// 文字列のイベント名から生成（イベント名のバリデーション付き）
    pub fn named(name: impl Into<String>, payload: Value) -> Result<Self, ValueObjectError> {
        Ok(Self::new(EventName::new(name.into())?, payload))
    }

    /// 接続確立時に本人へ送る `connect` イベント
    pub fn connect_notice(id: &ConnectionId) -> Self {
        Self::new(EventName::connect(), json!({ "id": id.as_str() }))
    }

    /// サーバー側から切断する直前に本人へ送る `disconnect` イベント
    pub fn disconnect_notice(reason: &str) -> Self {
        Self::new(EventName::disconnect(), json!({ "reason": reason }))
    }
}

/// クライアントが指定する中継先（送信者から見た相対指定）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    Connection(ConnectionId),
    /// ルームのメンバー（送信者を除く）
    Room(RoomId),
    /// 送信者を含む全接続
    All,
    /// 送信者以外の全接続
    Others,
}

impl EventTarget {
    pub fn scope_for(&self, sender: &ConnectionId) -> EventScope {
        match self {
            Self::Connection(id) => EventScope::Connection(id.clone()),
            Self::Room(room_id) => EventScope::Room {
                room_id: room_id.clone(),
                excluding: Some(sender.clone()),
            },
            Self::All => EventScope::All,
            Self::Others => EventScope::AllExcept(sender.clone()),
        }
    }
}

/// クライアントから受信したイベント
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub event: Event,
    pub target: Option<EventTarget>,
}

impl InboundEvent {
    pub fn new(event: Event) -> Self {
        Self {
            event,
            target: None,
        }
    }

    pub fn with_target(mut self, target: EventTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// JSON として解釈できないテキストフレームは `message` イベントとして扱う
    pub fn raw_text(text: impl Into<String>) -> Self {
        Self::new(Event::new(EventName::message(), Value::String(text.into())))
    }
}
