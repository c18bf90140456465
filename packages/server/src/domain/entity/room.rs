//! Room の読み取り専用スナップショット
//!
//! 実際のメンバー集合はレジストリが保持します。ここで定義するのは
//! ある時点のコピーで、HTTP API やテストから参照されます。

use crate::domain::value_object::{ConnectionId, RoomId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMember {
    pub id: ConnectionId,
    pub connected_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub id: RoomId,
    /// 接続時刻順
    pub members: Vec<RoomMember>,
    pub created_at: Timestamp,
    /// 空になっても削除されない（事前宣言された）ルームか
    pub retained: bool,
}

impl RoomSnapshot {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.members.iter().any(|member| &member.id == id)
    }
}
