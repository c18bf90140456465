//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する `RoomRegistry` trait の具体的な実装。
//! 全状態を 1 つの `Mutex` で保護し、クリティカルセクションは
//! join / leave / スナップショット取得の間だけに限定します。
//! 送信はロックを解放した後に呼び出し側で行う（スナップショット → 反復）。
//!
//! メンバーは `Weak<Connection>` で保持するため、所属していることで接続が
//! 生き残ることはありません。解放済みの参照はスナップショットから除外されます。

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Weak},
};

use async_trait::async_trait;
use kairo_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, RoomId, RoomMember, RoomRegistry, RoomSnapshot, Timestamp,
};

struct RoomEntry {
    members: BTreeMap<ConnectionId, Weak<Connection>>,
    created_at: Timestamp,
    retained: bool,
}

impl RoomEntry {
    fn new(created_at: Timestamp, retained: bool) -> Self {
        Self {
            members: BTreeMap::new(),
            created_at,
            retained,
        }
    }

    fn live_members(&self) -> Vec<Arc<Connection>> {
        self.members.values().filter_map(Weak::upgrade).collect()
    }

    fn snapshot(&self, id: &RoomId) -> RoomSnapshot {
        let mut members: Vec<RoomMember> = self
            .live_members()
            .iter()
            .map(|connection| RoomMember {
                id: connection.id().clone(),
                connected_at: connection.connected_at(),
            })
            .collect();
        members.sort_by(|a, b| a.connected_at.cmp(&b.connected_at).then(a.id.cmp(&b.id)));

        RoomSnapshot {
            id: id.clone(),
            members,
            created_at: self.created_at,
            retained: self.retained,
        }
    }
}

#[derive(Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, Weak<Connection>>,
    rooms: BTreeMap<RoomId, RoomEntry>,
    /// 接続 → 所属ルーム（単一ルームの不変条件をここで保証する）
    membership: HashMap<ConnectionId, RoomId>,
}

impl RegistryState {
    /// メンバーから外し、空になった非保持ルームは削除する
    fn detach(&mut self, connection_id: &ConnectionId) -> Option<RoomId> {
        let room_id = self.membership.remove(connection_id)?;
        let prune = match self.rooms.get_mut(&room_id) {
            Some(entry) => {
                entry.members.remove(connection_id);
                entry.members.is_empty() && !entry.retained
            }
            None => false,
        };
        if prune {
            self.rooms.remove(&room_id);
            tracing::debug!("Room '{}' is empty and was pruned", room_id);
        }
        Some(room_id)
    }
}

/// インメモリ Room Registry 実装
pub struct InMemoryRoomRegistry {
    state: Mutex<RegistryState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// ルーム作成時刻の取得に使う Clock を指定して作成
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn register(&self, connection: &Arc<Connection>) {
        let mut state = self.state.lock().await;
        state
            .connections
            .insert(connection.id().clone(), Arc::downgrade(connection));
        tracing::debug!("Connection '{}' registered", connection.id());
    }

    async fn declare(&self, room_id: RoomId) {
        let created_at = self.now();
        let mut state = self.state.lock().await;
        state
            .rooms
            .entry(room_id)
            .and_modify(|entry| entry.retained = true)
            .or_insert_with(|| RoomEntry::new(created_at, true));
    }

    async fn join(&self, room_id: &RoomId, connection: &Arc<Connection>) -> Option<RoomId> {
        let created_at = self.now();
        let connection_id = connection.id().clone();
        let mut state = self.state.lock().await;

        // close と remove_everywhere の間に割り込んだ join を入れない
        if !connection.is_open() {
            tracing::debug!(
                "Connection '{}' is not open, join '{}' ignored",
                connection_id,
                room_id
            );
            return None;
        }

        let current = state.membership.get(&connection_id).cloned();
        let previous = match current {
            Some(current) if &current == room_id => None,
            Some(_) => state.detach(&connection_id),
            None => None,
        };

        state
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| RoomEntry::new(created_at, false))
            .members
            .insert(connection_id.clone(), Arc::downgrade(connection));
        state.membership.insert(connection_id, room_id.clone());

        previous
    }

    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        if state.membership.get(connection_id) != Some(room_id) {
            return false;
        }
        state.detach(connection_id).is_some()
    }

    async fn members(&self, room_id: &RoomId) -> Vec<Arc<Connection>> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .map(RoomEntry::live_members)
            .unwrap_or_default()
    }

    async fn count_members(&self, room_id: &RoomId) -> usize {
        let state = self.state.lock().await;
        state.rooms.get(room_id).map_or(0, |entry| {
            entry
                .members
                .values()
                .filter(|member| member.strong_count() > 0)
                .count()
        })
    }

    async fn connections(&self) -> Vec<Arc<Connection>> {
        let state = self.state.lock().await;
        state
            .connections
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    async fn find(&self, connection_id: &ConnectionId) -> Option<Arc<Connection>> {
        let state = self.state.lock().await;
        state.connections.get(connection_id).and_then(Weak::upgrade)
    }

    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let state = self.state.lock().await;
        state.membership.get(connection_id).cloned()
    }

    async fn remove_everywhere(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let mut state = self.state.lock().await;
        state.connections.remove(connection_id);
        state.detach(connection_id)
    }

    async fn rooms(&self) -> Vec<RoomSnapshot> {
        let state = self.state.lock().await;
        state
            .rooms
            .iter()
            .map(|(id, entry)| entry.snapshot(id))
            .collect()
    }

    async fn room(&self, room_id: &RoomId) -> Option<RoomSnapshot> {
        let state = self.state.lock().await;
        state.rooms.get(room_id).map(|entry| entry.snapshot(room_id))
    }
}
