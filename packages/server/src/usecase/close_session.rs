//! UseCase: 接続終了処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CloseSessionUseCase::execute() メソッド
//! - 終了処理がちょうど 1 回だけ実行されること
//!
//! ### なぜこのテストが必要か
//! - 切断は読み取り側・送信側・シャットダウンの複数経路から同時に起こりうる
//! - 二重に処理されるとカウンタがずれ、在席通知が重複する
//!
//! ### どのような状況を想定しているか
//! - 正常系：ピアからの切断と残りの接続への在席通知
//! - 正常系：サーバー起点の切断では本人に `disconnect` が届く
//! - エッジケース：同時に 2 回クローズする

use std::{fmt, sync::Arc};

use crate::{
    config::SessionConfig,
    domain::{Connection, Event, EventDispatcher, RoomRegistry, SessionCounter},
};

use super::presence::PresenceNotifier;

/// 切断理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// ピアが Close フレームを送った、またはストリームが終わった
    PeerClosed,
    /// 読み書き中のトランスポートエラー
    TransportError,
    /// クライアントが `disconnect` イベントで切断を要求した
    ClientRequested,
    ServerShutdown,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PeerClosed => "peer-closed",
            Self::TransportError => "transport-error",
            Self::ClientRequested => "client-requested",
            Self::ServerShutdown => "server-shutdown",
        }
    }

    /// サーバー側から閉じる場合は、本人に `disconnect` を送ってから閉じる
    pub fn notifies_peer(&self) -> bool {
        matches!(self, Self::ClientRequested | Self::ServerShutdown)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 接続終了のユースケース
pub struct CloseSessionUseCase {
    registry: Arc<dyn RoomRegistry>,
    dispatcher: Arc<dyn EventDispatcher>,
    counter: Arc<SessionCounter>,
    presence: PresenceNotifier,
}

impl CloseSessionUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        dispatcher: Arc<dyn EventDispatcher>,
        counter: Arc<SessionCounter>,
        config: Arc<SessionConfig>,
    ) -> Self {
        let presence =
            PresenceNotifier::new(registry.clone(), dispatcher.clone(), config.presence_scope);
        Self {
            registry,
            dispatcher,
            counter,
            presence,
        }
    }

    /// 接続終了を実行
    ///
    /// # Returns
    ///
    /// * `true` - この呼び出しで終了処理を行った
    /// * `false` - 既に閉じていた（何もしない）
    pub async fn execute(&self, connection: &Arc<Connection>, reason: CloseReason) -> bool {
        let notice = Event::disconnect_notice(reason.as_str());

        // 1. 状態遷移（ちょうど 1 回だけ成功する）。サーバー起点なら本人への通知を最後に積む
        let final_event = reason.notifies_peer().then(|| notice.clone());
        if !connection.close_with(final_event) {
            tracing::debug!(
                "Connection '{}' already closed, skipping ({})",
                connection.id(),
                reason
            );
            return false;
        }

        // 2. カウンタと Registry から取り除く
        let open_connections = self.counter.decrement();
        let left_room = self.registry.remove_everywhere(connection.id()).await;
        tracing::info!(
            "Connection '{}' closed: {} ({} open)",
            connection.id(),
            reason,
            open_connections
        );

        // 3. disconnect ハンドラと在席通知
        self.dispatcher.dispatch_inbound(connection, &notice).await;
        self.presence
            .announce(connection.id(), left_room.as_ref(), open_connections)
            .await;

        true
    }
}
