//! Room Registry trait 定義
//!
//! ルーム ID → メンバー接続の対応を管理するインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 不変条件
//!
//! - 1 つの接続が同時に所属できるルームは高々 1 つ
//! - メンバーは弱参照で保持する（所属していることが接続を生かし続けることはない）
//! - 変更は必ずこの trait の操作を通して行う

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    entity::{Connection, RoomSnapshot},
    value_object::{ConnectionId, RoomId},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// 接続を全接続集合に登録（`broadcast_all` の対象になる）
    async fn register(&self, connection: &Arc<Connection>);

    /// 空になっても削除されないルームとして事前宣言
    async fn declare(&self, room_id: RoomId);

    /// ルームに参加させる
    ///
    /// 別のルームに所属していた場合は先にそこから外し、そのルーム ID を返す。
    /// 同じルームへの再参加は何もしない。`Open` でない接続は参加させない。
    async fn join(&self, room_id: &RoomId, connection: &Arc<Connection>) -> Option<RoomId>;

    /// ルームから外す。メンバーでなければ何もせず `false`
    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool;

    /// ルームの現在のメンバー（スナップショット）。存在しないルームは空
    async fn members(&self, room_id: &RoomId) -> Vec<Arc<Connection>>;

    /// ルームの現在のメンバー数。存在しないルームは 0
    async fn count_members(&self, room_id: &RoomId) -> usize;

    /// 全接続（スナップショット）
    async fn connections(&self) -> Vec<Arc<Connection>>;

    /// 接続 ID から接続を取得
    async fn find(&self, connection_id: &ConnectionId) -> Option<Arc<Connection>>;

    /// 接続が現在所属しているルーム
    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// 所属ルームと全接続集合の両方から取り除く（切断時）。所属していたルームを返す
    async fn remove_everywhere(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// 全ルームのスナップショット（ルーム ID 順）
    async fn rooms(&self) -> Vec<RoomSnapshot>;

    /// 指定ルームのスナップショット
    async fn room(&self, room_id: &RoomId) -> Option<RoomSnapshot>;
}
