//! Server execution logic.

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::usecase::{
    CloseSessionUseCase, DispatchEventUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
    GetStatsUseCase, OpenSessionUseCase,
};

use super::{
    handler::{get_room_detail, get_rooms, get_stats, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// シャットダウン時に接続が閉じ終わるのを待つ上限
const DRAIN_TIMEOUT: Duration = Duration::from_secs(3);
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Event room server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     open_session_usecase,
///     close_session_usecase,
///     dispatch_event_usecase,
///     get_rooms_usecase,
///     get_room_detail_usecase,
///     get_stats_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 3000).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(
        open_session_usecase: Arc<OpenSessionUseCase>,
        close_session_usecase: Arc<CloseSessionUseCase>,
        dispatch_event_usecase: Arc<DispatchEventUseCase>,
        get_rooms_usecase: Arc<GetRoomsUseCase>,
        get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
        get_stats_usecase: Arc<GetStatsUseCase>,
    ) -> Self {
        let state = Arc::new(AppState {
            open_session_usecase,
            close_session_usecase,
            dispatch_event_usecase,
            get_rooms_usecase,
            get_room_detail_usecase,
            get_stats_usecase,
            shutdown: CancellationToken::new(),
        });
        Self { state }
    }

    /// キャンセルすると全接続を `server-shutdown` で閉じるトークン
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Build the router (WebSocket + HTTP API)
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/stats", get(get_stats))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Event room server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        let token = self.shutdown_token();
        tokio::spawn(async move {
            shutdown_signal().await;
            token.cancel();
        });

        self.serve(listener).await?;
        Ok(())
    }

    /// Serve on an already bound listener until the shutdown token is cancelled
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let token = self.shutdown_token();
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await?;

        self.drain().await;
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// 開いている接続が閉じ終わるのを待つ
    async fn drain(&self) {
        let stats = self.state.get_stats_usecase.clone();
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while stats.execute().await.open_connections > 0 {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!("Some connections did not close within {:?}", DRAIN_TIMEOUT);
        }
    }
}
