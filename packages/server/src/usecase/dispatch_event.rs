//! UseCase: 受信イベント処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DispatchEventUseCase::execute() メソッド
//! - 予約済みイベント（join / leave / disconnect / connect）の扱い
//! - ハンドラ呼び出しと、中継先指定によるファンアウト
//!
//! ### なぜこのテストが必要か
//! - クライアントから届くイベントの振り分けを一箇所で保証する
//! - ルーム宛ての中継が送信者にエコーされないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルーム移動、ルーム宛て・全体宛ての中継
//! - 異常系：予約済みイベント、不正なペイロード、クローズ済み接続

use std::sync::Arc;

use serde_json::Value;

use crate::{
    config::SessionConfig,
    domain::{Connection, EventDispatcher, EventName, InboundEvent, RoomId, RoomRegistry},
};

use super::{error::DispatchError, presence::PresenceNotifier};

/// 受信イベント処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Joined {
        room_id: RoomId,
        previous: Option<RoomId>,
    },
    Left {
        room_id: RoomId,
        was_member: bool,
    },
    /// クライアントが `disconnect` を送ってきた（呼び出し側が接続を閉じる）
    CloseRequested,
    Routed {
        /// 呼び出したハンドラ数
        handlers: usize,
        /// 中継先へ届けた数
        delivered: usize,
    },
}

/// 受信イベント処理のユースケース
pub struct DispatchEventUseCase {
    registry: Arc<dyn RoomRegistry>,
    dispatcher: Arc<dyn EventDispatcher>,
    config: Arc<SessionConfig>,
    presence: PresenceNotifier,
}

impl DispatchEventUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        dispatcher: Arc<dyn EventDispatcher>,
        config: Arc<SessionConfig>,
    ) -> Self {
        let presence =
            PresenceNotifier::new(registry.clone(), dispatcher.clone(), config.presence_scope);
        Self {
            registry,
            dispatcher,
            config,
            presence,
        }
    }

    /// 受信イベントを処理する
    ///
    /// # Arguments
    ///
    /// * `from` - 送信元の接続
    /// * `inbound` - 受信したイベントと中継先
    pub async fn execute(
        &self,
        from: &Arc<Connection>,
        inbound: InboundEvent,
    ) -> Result<DispatchOutcome, DispatchError> {
        if !from.is_open() {
            return Err(DispatchError::ConnectionNotOpen(from.id().clone()));
        }

        let InboundEvent { event, target } = inbound;
        match event.name.as_str() {
            EventName::CONNECT => Err(DispatchError::ReservedEvent(event.name.to_string())),
            EventName::DISCONNECT => Ok(DispatchOutcome::CloseRequested),
            EventName::JOIN => {
                let room_id = room_in_payload(&event.payload)?.ok_or_else(|| {
                    DispatchError::InvalidPayload("join requires a room".to_string())
                })?;
                let already_member =
                    self.registry.room_of(from.id()).await.as_ref() == Some(&room_id);
                let previous = self.registry.join(&room_id, from).await;
                tracing::info!(
                    "Connection '{}' joined '{}' (from {:?})",
                    from.id(),
                    room_id,
                    previous.as_ref().map(RoomId::as_str)
                );
                if self.config.announce_room {
                    self.dispatcher
                        .emit_to_room(&room_id, &SessionConfig::room_notice(&room_id), None)
                        .await;
                }
                if let Some(previous) = &previous {
                    self.presence.announce_membership(from.id(), previous).await;
                }
                if !already_member {
                    self.presence.announce_membership(from.id(), &room_id).await;
                }
                Ok(DispatchOutcome::Joined { room_id, previous })
            }
            EventName::LEAVE => {
                let room_id = match room_in_payload(&event.payload)? {
                    Some(room_id) => room_id,
                    None => self.registry.room_of(from.id()).await.ok_or_else(|| {
                        DispatchError::InvalidPayload("not a member of any room".to_string())
                    })?,
                };
                let was_member = self.registry.leave(&room_id, from.id()).await;
                tracing::info!(
                    "Connection '{}' left '{}' (member: {})",
                    from.id(),
                    room_id,
                    was_member
                );
                if was_member {
                    self.presence.announce_membership(from.id(), &room_id).await;
                }
                Ok(DispatchOutcome::Left {
                    room_id,
                    was_member,
                })
            }
            _ => {
                tracing::info!(
                    "Received '{}' from '{}': {}",
                    event.name,
                    from.id(),
                    event.payload
                );
                let handlers = self.dispatcher.dispatch_inbound(from, &event).await;
                let delivered = match &target {
                    Some(target) => {
                        self.dispatcher
                            .emit(&target.scope_for(from.id()), &event)
                            .await
                    }
                    None => 0,
                };
                Ok(DispatchOutcome::Routed {
                    handlers,
                    delivered,
                })
            }
        }
    }
}

/// `{"room": "<id>"}` または `"<id>"` からルーム ID を取り出す
fn room_in_payload(payload: &Value) -> Result<Option<RoomId>, DispatchError> {
    let raw = match payload {
        Value::Null => return Ok(None),
        Value::String(room) => room,
        Value::Object(fields) => match fields.get("room") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(room)) => room,
            Some(other) => {
                return Err(DispatchError::InvalidPayload(format!(
                    "room must be a string, got {other}"
                )));
            }
        },
        other => {
            return Err(DispatchError::InvalidPayload(format!(
                "unexpected payload {other}"
            )));
        }
    };
    RoomId::new(raw.clone())
        .map(Some)
        .map_err(|e| DispatchError::InvalidPayload(e.to_string()))
}
