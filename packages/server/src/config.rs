//! Session coordinator configuration.
//!
//! 接続時の挨拶・在席通知の範囲・遅延送信イベントなど、
//! 接続ライフサイクルで流れるイベントをここでまとめて決めます。

use std::time::Duration;

use clap::ValueEnum;
use serde_json::json;

use crate::domain::{Event, EventName, RoomId};

/// 在席数通知の範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PresenceScope {
    /// サーバー全体の接続数を、本人以外の全接続へ通知する
    #[default]
    Global,
    /// デフォルトルームの人数を、ルーム内の本人以外へ通知する
    Room,
}

/// 接続から一定時間後に本人へ送るイベント
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub delay: Duration,
    pub event: Event,
}

impl ScheduledEvent {
    pub fn new(delay: Duration, event: Event) -> Self {
        Self { delay, event }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 接続直後に自動で参加させるルーム
    pub default_room: RoomId,
    pub presence_scope: PresenceScope,
    /// 本人にだけ送る挨拶（`None` なら送らない）
    pub welcome: Option<Event>,
    /// ルーム参加を、本人を含むルーム全員へ知らせるか
    pub announce_room: bool,
    pub scheduled: Vec<ScheduledEvent>,
}

impl SessionConfig {
    pub const PRESENCE_EVENT: &'static str = "newUserConnect";
    pub const ROOM_NOTICE_EVENT: &'static str = "connectedRoom";

    pub fn new(default_room: RoomId) -> Self {
        Self {
            default_room,
            presence_scope: PresenceScope::default(),
            welcome: Some(Event::new(
                Self::presence_event_name(),
                json!({ "msg": "Welcome new user" }),
            )),
            announce_room: true,
            scheduled: Vec::new(),
        }
    }

    pub fn with_presence_scope(mut self, presence_scope: PresenceScope) -> Self {
        self.presence_scope = presence_scope;
        self
    }

    /// 2 秒後の `message` と 5 秒後の `myCustomEvent` を追加する
    pub fn with_demo_events(mut self) -> Self {
        self.scheduled.push(ScheduledEvent::new(
            Duration::from_secs(2),
            Event::new(
                EventName::message(),
                json!("Message from server pre-defined event"),
            ),
        ));
        self.scheduled.push(ScheduledEvent::new(
            Duration::from_secs(5),
            Event::new(
                EventName::from_static("myCustomEvent"),
                json!({ "des": "A custom message from server" }),
            ),
        ));
        self
    }

    pub fn presence_event_name() -> EventName {
        EventName::from_static(Self::PRESENCE_EVENT)
    }

    /// `<n> Users connected` 形式の在席通知
    pub fn presence_event(count: usize) -> Event {
        Event::new(
            Self::presence_event_name(),
            json!({ "msg": format!("{count} Users connected") }),
        )
    }

    /// `You are connected to room <room>` 形式のルーム参加通知
    pub fn room_notice(room_id: &RoomId) -> Event {
        Event::new(
            EventName::from_static(Self::ROOM_NOTICE_EVENT),
            json!(format!("You are connected to room {room_id}")),
        )
    }
}
