//! UseCase: 接続開始処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - OpenSessionUseCase::execute() メソッド
//! - 接続の登録、デフォルトルームへの参加、接続時のイベント送出
//!
//! ### なぜこのテストが必要か
//! - 本人への挨拶と、他の接続への在席通知の宛先が取り違えられないことを保証
//! - 接続数カウンタが接続ごとに 1 つだけ増えることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：既存接続 Y, Z がいる状態で X が接続する
//! - 正常系：遅延送信イベントの予約
//! - 正常系：`connect` ハンドラの呼び出し

use std::sync::Arc;

use kairo_shared::time::{Clock, SystemClock};

use crate::{
    config::SessionConfig,
    domain::{
        Connection, ConnectionIdFactory, Event, EventDispatcher, OutboundSender, RoomRegistry,
        SessionCounter, Timestamp,
    },
    infrastructure::scheduler::schedule_deferred,
};

use super::{error::OpenSessionError, presence::PresenceNotifier};

/// 接続開始のユースケース
pub struct OpenSessionUseCase {
    registry: Arc<dyn RoomRegistry>,
    dispatcher: Arc<dyn EventDispatcher>,
    counter: Arc<SessionCounter>,
    config: Arc<SessionConfig>,
    presence: PresenceNotifier,
    clock: Arc<dyn Clock>,
}

impl OpenSessionUseCase {
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
            config,
            presence,
            clock: Arc::new(SystemClock),
        }
    }

    /// 接続時刻の取得に使う Clock を差し替える
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 接続開始を実行
    ///
    /// # Arguments
    ///
    /// * `outbound` - この接続へのイベント送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<Connection>)` - `Open` 状態の接続
    /// * `Err(OpenSessionError)` - 接続 ID が衝突した場合
    pub async fn execute(
        &self,
        outbound: OutboundSender,
    ) -> Result<Arc<Connection>, OpenSessionError> {
        // 1. 接続を生成して登録
        let id = ConnectionIdFactory::generate();
        if self.registry.find(&id).await.is_some() {
            return Err(OpenSessionError::DuplicateConnectionId(id));
        }
        let connected_at = Timestamp::new(self.clock.now_millis());
        let connection = Arc::new(Connection::new(id, connected_at, outbound));
        connection.mark_open();
        self.registry.register(&connection).await;
        let open_connections = self.counter.increment();

        // 2. デフォルトルームへ参加
        let room_id = &self.config.default_room;
        self.registry.join(room_id, &connection).await;
        tracing::info!(
            "Connection '{}' opened and joined '{}' ({} open)",
            connection.id(),
            room_id,
            open_connections
        );

        // 3. 本人へ connect と挨拶
        self.dispatcher
            .emit_to(&connection, &Event::connect_notice(connection.id()));
        if let Some(welcome) = &self.config.welcome {
            self.dispatcher.emit_to(&connection, welcome);
        }

        // 4. ルーム全員（本人を含む）へ参加通知、本人以外へ在席数
        if self.config.announce_room {
            self.dispatcher
                .emit_to_room(room_id, &SessionConfig::room_notice(room_id), None)
                .await;
        }
        self.presence
            .announce(connection.id(), Some(room_id), open_connections)
            .await;

        // 5. connect ハンドラと遅延送信
        self.dispatcher
            .dispatch_inbound(&connection, &Event::connect_notice(connection.id()))
            .await;
        for scheduled in &self.config.scheduled {
            schedule_deferred(&connection, self.dispatcher.clone(), scheduled.clone());
        }

        Ok(connection)
    }
}
