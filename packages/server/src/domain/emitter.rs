//! Event Dispatcher trait 定義
//!
//! イベントを 1 接続・ルーム・全接続へ配信するインターフェースと、
//! 受信イベントのハンドラ登録インターフェースを定義します。
//!
//! 配信はベストエフォート: 個々の送信失敗はログに残すだけで、呼び出し元にも
//! 他の宛先への配信にも影響しない。

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    entity::{Connection, Event},
    value_object::{ConnectionId, EventName, RoomId},
};

/// 配信先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScope {
    /// 単一の接続
    Connection(ConnectionId),
    /// ルームのメンバー（`excluding` を除く）
    Room {
        room_id: RoomId,
        excluding: Option<ConnectionId>,
    },
    /// 全接続
    All,
    /// 指定した接続（通常は送信者）以外の全接続
    AllExcept(ConnectionId),
}

#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// 1 接続へ送信。失敗時はログを残して `false`
    fn emit_to(&self, connection: &Connection, event: &Event) -> bool;

    /// ルームのメンバーへ送信し、届けた数を返す
    async fn emit_to_room(
        &self,
        room_id: &RoomId,
        event: &Event,
        excluding: Option<&ConnectionId>,
    ) -> usize;

    /// 全接続へ送信し、届けた数を返す
    async fn broadcast_all(&self, event: &Event, excluding: Option<&ConnectionId>) -> usize;

    /// `EventScope` に従って送信し、届けた数を返す
    async fn emit(&self, scope: &EventScope, event: &Event) -> usize;
}

/// 受信イベントのハンドラ
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, from: &Arc<Connection>, event: &Event, emitter: &dyn EventEmitter);
}

/// 同期クロージャをそのままハンドラとして使えるようにする
#[async_trait]
impl<F> EventHandler for F
where
    F: Fn(&Arc<Connection>, &Event) + Send + Sync,
{
    async fn handle(&self, from: &Arc<Connection>, event: &Event, _emitter: &dyn EventEmitter) {
        self(from, event);
    }
}

/// 配信 + ハンドラ登録の能力セット
#[async_trait]
pub trait EventDispatcher: EventEmitter {
    async fn register_handler(&self, name: EventName, handler: Arc<dyn EventHandler>);

    /// 受信イベントを登録済みハンドラへ渡し、呼び出したハンドラ数を返す
    ///
    /// ハンドラが無ければ何もしない（エラーにはしない）。
    async fn dispatch_inbound(&self, from: &Arc<Connection>, event: &Event) -> usize;
}
