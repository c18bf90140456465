//! Registry のスナップショットを使った EventDispatcher 実装
//!
//! ## 責務
//!
//! - 宛先集合を Registry から取得（スナップショット）し、ロックを持たずに送信
//! - 受信イベントのハンドラ登録と呼び出し
//!
//! 個々の接続への送信失敗はログに残すだけで、残りの宛先への配信は継続します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    Connection, ConnectionId, Event, EventDispatcher, EventEmitter, EventHandler, EventName,
    EventScope, RoomId, RoomRegistry,
};

pub struct FanoutDispatcher {
    registry: Arc<dyn RoomRegistry>,
    /// イベント名 → 登録順のハンドラ
    handlers: RwLock<HashMap<EventName, Vec<Arc<dyn EventHandler>>>>,
}

impl FanoutDispatcher {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self {
            registry,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    fn fan_out(
        &self,
        targets: Vec<Arc<Connection>>,
        event: &Event,
        excluding: Option<&ConnectionId>,
    ) -> usize {
        targets
            .iter()
            .filter(|connection| Some(connection.id()) != excluding)
            .filter(|connection| self.emit_to(connection, event))
            .count()
    }
}

#[async_trait]
impl EventEmitter for FanoutDispatcher {
    fn emit_to(&self, connection: &Connection, event: &Event) -> bool {
        match connection.send(event.clone()) {
            Ok(()) => {
                tracing::debug!("Emitted '{}' to connection '{}'", event.name, connection.id());
                true
            }
            Err(e) => {
                tracing::warn!("Failed to emit '{}': {}", event.name, e);
                false
            }
        }
    }

    async fn emit_to_room(
        &self,
        room_id: &RoomId,
        event: &Event,
        excluding: Option<&ConnectionId>,
    ) -> usize {
        let members = self.registry.members(room_id).await;
        let delivered = self.fan_out(members, event, excluding);
        tracing::debug!(
            "Emitted '{}' to room '{}' ({} delivered)",
            event.name,
            room_id,
            delivered
        );
        delivered
    }

    async fn broadcast_all(&self, event: &Event, excluding: Option<&ConnectionId>) -> usize {
        let connections = self.registry.connections().await;
        let delivered = self.fan_out(connections, event, excluding);
        tracing::debug!("Broadcasted '{}' ({} delivered)", event.name, delivered);
        delivered
    }

    async fn emit(&self, scope: &EventScope, event: &Event) -> usize {
        match scope {
            EventScope::Connection(id) => match self.registry.find(id).await {
                Some(connection) => usize::from(self.emit_to(&connection, event)),
                None => {
                    tracing::warn!("Connection '{}' not found, '{}' dropped", id, event.name);
                    0
                }
            },
            EventScope::Room { room_id, excluding } => {
                self.emit_to_room(room_id, event, excluding.as_ref()).await
            }
            EventScope::All => self.broadcast_all(event, None).await,
            EventScope::AllExcept(id) => self.broadcast_all(event, Some(id)).await,
        }
    }
}

#[async_trait]
impl EventDispatcher for FanoutDispatcher {
    async fn register_handler(&self, name: EventName, handler: Arc<dyn EventHandler>) {
        tracing::debug!("Handler registered for '{}'", name);
        self.handlers
            .write()
            .await
            .entry(name)
            .or_default()
            .push(handler);
    }

    async fn dispatch_inbound(&self, from: &Arc<Connection>, event: &Event) -> usize {
        // ハンドラ内からの register_handler でデッドロックしないよう、先にコピーする
        let handlers = {
            let handlers = self.handlers.read().await;
            handlers.get(&event.name).cloned().unwrap_or_default()
        };
        if handlers.is_empty() {
            tracing::debug!(
                "No handler for '{}' from connection '{}'",
                event.name,
                from.id()
            );
            return 0;
        }

        for handler in &handlers {
            handler.handle(from, event, self).await;
        }
        handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{OutboundReceiver, Timestamp, outbound_channel, registry::MockRoomRegistry},
        infrastructure::registry::InMemoryRoomRegistry,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - emit_to_room / broadcast_all の宛先選定（除外指定を含む）
    // - 一部の接続が壊れていても残りへ配信が続くこと
    // - ハンドラの登録順呼び出しと、ハンドラ未登録時の無視
    //
    // 【なぜこのテストが必要か】
    // - 送信者にエコーしない・他人の部屋に漏れないことがプロトコルの前提
    // ========================================

    fn create_test_connection(id: &str) -> (Arc<Connection>, OutboundReceiver) {
        let (tx, rx) = outbound_channel();
        let connection = Arc::new(Connection::new(
            ConnectionId::new(id.to_string()).unwrap(),
            Timestamp::new(1000),
            tx,
        ));
        connection.mark_open();
        (connection, rx)
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn event(name: &str) -> Event {
        Event::named(name, json!({ "n": 1 })).unwrap()
    }

    #[tokio::test]
    async fn test_emit_to_room_excludes_sender_and_other_rooms() {
        // テスト項目: ルーム配信は除外指定の接続と他ルームのメンバーに届かない
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let dispatcher = FanoutDispatcher::new(registry.clone());
        let (alice, mut rx_alice) = create_test_connection("alice");
        let (bob, mut rx_bob) = create_test_connection("bob");
        let (carol, mut rx_carol) = create_test_connection("carol");
        registry.join(&room("lobby"), &alice).await;
        registry.join(&room("lobby"), &bob).await;
        registry.join(&room("games"), &carol).await;

        // when (操作):
        let delivered = dispatcher
            .emit_to_room(&room("lobby"), &event("chat"), Some(alice.id()))
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(rx_bob.recv().await, Some(event("chat")));
        assert!(rx_alice.try_recv().is_err());
        assert!(rx_carol.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_all_except_sender() {
        // テスト項目: AllExcept は送信者以外の全接続へ届く
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let dispatcher = FanoutDispatcher::new(registry.clone());
        let (alice, mut rx_alice) = create_test_connection("alice");
        let (bob, mut rx_bob) = create_test_connection("bob");
        let (carol, mut rx_carol) = create_test_connection("carol");
        for connection in [&alice, &bob, &carol] {
            registry.register(connection).await;
        }

        // when (操作):
        let delivered = dispatcher
            .emit(&EventScope::AllExcept(alice.id().clone()), &event("news"))
            .await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        assert_eq!(rx_bob.recv().await, Some(event("news")));
        assert_eq!(rx_carol.recv().await, Some(event("news")));
        assert!(rx_alice.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_to_unknown_connection_is_dropped() {
        // テスト項目: 存在しない接続宛ては配信数 0 で、エラーにはならない
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let dispatcher = FanoutDispatcher::new(registry);

        // when (操作):
        let scope = EventScope::Connection(ConnectionId::new("ghost".to_string()).unwrap());
        let delivered = dispatcher.emit(&scope, &event("ping")).await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_broadcast_continues_after_partial_failure() {
        // テスト項目: 壊れた接続が混ざっていても他の接続には配信される
        // given (前提条件):
        let (broken, rx_broken) = create_test_connection("a-broken");
        let (bob, mut rx_bob) = create_test_connection("bob");
        let (carol, mut rx_carol) = create_test_connection("carol");
        drop(rx_broken);

        let snapshot = vec![broken.clone(), bob.clone(), carol.clone()];
        let mut registry = MockRoomRegistry::new();
        registry
            .expect_connections()
            .times(1)
            .returning(move || snapshot.clone());
        let dispatcher = FanoutDispatcher::new(Arc::new(registry));

        // when (操作):
        let delivered = dispatcher.broadcast_all(&event("news"), None).await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        assert_eq!(rx_bob.recv().await, Some(event("news")));
        assert_eq!(rx_carol.recv().await, Some(event("news")));
    }

    #[tokio::test]
    async fn test_closed_connection_is_skipped() {
        // テスト項目: クローズ済みの接続には送られず、配信数にも数えられない
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let dispatcher = FanoutDispatcher::new(registry.clone());
        let (alice, _rx_alice) = create_test_connection("alice");
        let (bob, mut rx_bob) = create_test_connection("bob");
        registry.join(&room("lobby"), &alice).await;
        registry.join(&room("lobby"), &bob).await;
        alice.close();

        // when (操作):
        let delivered = dispatcher.emit_to_room(&room("lobby"), &event("chat"), None).await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(rx_bob.recv().await, Some(event("chat")));
    }

    #[tokio::test]
    async fn test_dispatch_inbound_runs_handlers_in_registration_order() {
        // テスト項目: 同名イベントのハンドラが登録順に全て呼ばれる
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let dispatcher = FanoutDispatcher::new(registry);
        let (alice, _rx) = create_test_connection("alice");
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        for label in ["first", "second"] {
            let calls = calls.clone();
            let handler = move |_: &Arc<Connection>, _: &Event| {
                calls.lock().unwrap().push(label);
            };
            dispatcher
                .register_handler(EventName::new("ping".to_string()).unwrap(), Arc::new(handler))
                .await;
        }

        // when (操作):
        let invoked = dispatcher.dispatch_inbound(&alice, &event("ping")).await;

        // then (期待する結果):
        assert_eq!(invoked, 2);
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_dispatch_inbound_without_handler_is_ignored() {
        // テスト項目: ハンドラ未登録のイベントは無視される
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let dispatcher = FanoutDispatcher::new(registry);
        let (alice, _rx) = create_test_connection("alice");
        let counter = Arc::new(AtomicUsize::new(0));
        let counted = counter.clone();
        let handler = move |_: &Arc<Connection>, _: &Event| {
            counted.fetch_add(1, Ordering::SeqCst);
        };
        dispatcher
            .register_handler(EventName::new("ping".to_string()).unwrap(), Arc::new(handler))
            .await;

        // when (操作):
        let invoked = dispatcher.dispatch_inbound(&alice, &event("unknown")).await;

        // then (期待する結果):
        assert_eq!(invoked, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    struct EchoToRoom;

    #[async_trait]
    impl EventHandler for EchoToRoom {
        async fn handle(&self, from: &Arc<Connection>, event: &Event, emitter: &dyn EventEmitter) {
            emitter
                .emit_to_room(&RoomId::new("lobby".to_string()).unwrap(), event, Some(from.id()))
                .await;
        }
    }

    #[tokio::test]
    async fn test_handler_can_emit_through_dispatcher() {
        // テスト項目: ハンドラに渡される emitter から配信できる
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let dispatcher = FanoutDispatcher::new(registry.clone());
        let (alice, mut rx_alice) = create_test_connection("alice");
        let (bob, mut rx_bob) = create_test_connection("bob");
        registry.join(&room("lobby"), &alice).await;
        registry.join(&room("lobby"), &bob).await;
        dispatcher
            .register_handler(EventName::new("shout".to_string()).unwrap(), Arc::new(EchoToRoom))
            .await;

        // when (操作):
        dispatcher.dispatch_inbound(&alice, &event("shout")).await;

        // then (期待する結果):
        assert_eq!(rx_bob.recv().await, Some(event("shout")));
        assert!(rx_alice.try_recv().is_err());
    }
}
