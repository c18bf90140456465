//! 在席数の通知
//!
//! 接続・切断のたびに `newUserConnect` `{"msg": "<n> Users connected"}` を
//! 本人以外へ送ります。範囲は `PresenceScope` で切り替えます。

use std::sync::Arc;

use crate::{
    config::{PresenceScope, SessionConfig},
    domain::{ConnectionId, EventDispatcher, RoomId, RoomRegistry},
};

pub struct PresenceNotifier {
    registry: Arc<dyn RoomRegistry>,
    dispatcher: Arc<dyn EventDispatcher>,
    scope: PresenceScope,
}

impl PresenceNotifier {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        dispatcher: Arc<dyn EventDispatcher>,
        scope: PresenceScope,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            scope,
        }
    }

    /// 在席数を通知し、届けた数を返す
    ///
    /// * `subject` - 接続・切断した本人（通知対象から除外）
    /// * `room_id` - 本人が所属していた（する）ルーム。`Room` スコープでのみ使う
    /// * `open_connections` - 更新後のサーバー全体の接続数。`Global` スコープでのみ使う
    pub async fn announce(
        &self,
        subject: &ConnectionId,
        room_id: Option<&RoomId>,
        open_connections: usize,
    ) -> usize {
        match self.scope {
            PresenceScope::Global => {
                let event = SessionConfig::presence_event(open_connections);
                self.dispatcher.broadcast_all(&event, Some(subject)).await
            }
            PresenceScope::Room => match room_id {
                Some(room_id) => self.announce_to_room(subject, room_id).await,
                None => 0,
            },
        }
    }

    /// join / leave でルームの人数が変わったことを通知する
    ///
    /// サーバー全体の接続数は変わらないので、`Room` スコープでのみ送る。
    pub async fn announce_membership(&self, subject: &ConnectionId, room_id: &RoomId) -> usize {
        match self.scope {
            PresenceScope::Global => 0,
            PresenceScope::Room => self.announce_to_room(subject, room_id).await,
        }
    }

    async fn announce_to_room(&self, subject: &ConnectionId, room_id: &RoomId) -> usize {
        let count = self.registry.count_members(room_id).await;
        let event = SessionConfig::presence_event(count);
        self.dispatcher
            .emit_to_room(room_id, &event, Some(subject))
            .await
    }
}
