//! ユースケースのテスト用フィクスチャ

use std::sync::Arc;

use kairo_shared::time::FixedClock;

use crate::{
    config::{PresenceScope, SessionConfig},
    domain::{
        Connection, ConnectionId, Event, OutboundReceiver, RoomId, SessionCounter, Timestamp,
        outbound_channel,
    },
    infrastructure::{dispatcher::FanoutDispatcher, registry::InMemoryRoomRegistry},
};

use super::{CloseSessionUseCase, DispatchEventUseCase, OpenSessionUseCase, PresenceNotifier};

pub(crate) struct Fixture {
    pub registry: Arc<InMemoryRoomRegistry>,
    pub dispatcher: Arc<FanoutDispatcher>,
    pub counter: Arc<SessionCounter>,
    pub config: Arc<SessionConfig>,
}

impl Fixture {
    pub fn new(config: SessionConfig) -> Self {
        let registry = Arc::new(InMemoryRoomRegistry::with_clock(Arc::new(
            FixedClock::new(1_000),
        )));
        let dispatcher = Arc::new(FanoutDispatcher::new(registry.clone()));
        Self {
            registry,
            dispatcher,
            counter: Arc::new(SessionCounter::new()),
            config: Arc::new(config),
        }
    }

    pub fn open_session(&self) -> OpenSessionUseCase {
        OpenSessionUseCase::new(
            self.registry.clone(),
            self.dispatcher.clone(),
            self.counter.clone(),
            self.config.clone(),
        )
    }

    pub fn close_session(&self) -> CloseSessionUseCase {
        CloseSessionUseCase::new(
            self.registry.clone(),
            self.dispatcher.clone(),
            self.counter.clone(),
            self.config.clone(),
        )
    }

    pub fn dispatch_event(&self) -> DispatchEventUseCase {
        DispatchEventUseCase::new(
            self.registry.clone(),
            self.dispatcher.clone(),
            self.config.clone(),
        )
    }

    pub fn presence(&self, scope: PresenceScope) -> PresenceNotifier {
        PresenceNotifier::new(self.registry.clone(), self.dispatcher.clone(), scope)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new(SessionConfig::new(room("room-1")))
    }
}

pub(crate) fn room(id: &str) -> RoomId {
    RoomId::new(id.to_string()).unwrap()
}

pub(crate) fn create_test_connection(
    id: &str,
    connected_at: i64,
) -> (Arc<Connection>, OutboundReceiver) {
    let (tx, rx) = outbound_channel();
    let connection = Arc::new(Connection::new(
        ConnectionId::new(id.to_string()).unwrap(),
        Timestamp::new(connected_at),
        tx,
    ));
    connection.mark_open();
    (connection, rx)
}

/// 受信チャネルに溜まっているイベントを全て取り出す
pub(crate) fn drain(rx: &mut OutboundReceiver) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// 指定した名前のイベントのペイロードだけを取り出す
pub(crate) fn payloads_named(events: &[Event], name: &str) -> Vec<serde_json::Value> {
    events
        .iter()
        .filter(|event| event.name.as_str() == name)
        .map(|event| event.payload.clone())
        .collect()
}
