//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::task::JoinHandle;

use crate::{
    domain::{Connection, InboundEvent, OutboundReceiver, outbound_channel},
    infrastructure::dto::websocket::{ClientFrame, EventFrame},
    ui::state::AppState,
    usecase::{CloseReason, DispatchError, DispatchOutcome},
};

/// 切断後、送信待ちのイベント（`disconnect` など）を書き出すまで待つ上限
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the connection's outbound channel into the WebSocket sink.
///
/// The channel closes when the connection is closed; the task then sends a
/// Close frame and exits.
fn pusher_loop(
    mut rx: OutboundReceiver,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = EventFrame::from(event);
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to serialize '{}': {}", frame.event, e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(text.into())).await {
                tracing::debug!("WebSocket send failed: {}", e);
                return;
            }
        }
        if let Err(e) = sender.send(Message::Close(None)).await {
            tracing::debug!("Failed to send close frame: {}", e);
        }
    })
}

/// テキストフレームを受信イベントに変換する
///
/// JSON のクライアントフレームとして読めないテキストは `message` イベントとして扱う。
/// フレームとしては読めるがイベント名・宛先が不正なものは捨てる。
fn parse_inbound(text: &str) -> Option<InboundEvent> {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => match InboundEvent::try_from(frame) {
            Ok(inbound) => Some(inbound),
            Err(e) => {
                tracing::warn!("Dropped invalid frame: {}", e);
                None
            }
        },
        Err(_) => Some(InboundEvent::raw_text(text)),
    }
}

/// Reads frames from the peer until it closes or asks to disconnect.
async fn receive_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    connection: Arc<Connection>,
) -> CloseReason {
    while let Some(message) = receiver.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("WebSocket error on '{}': {}", connection.id(), e);
                return CloseReason::TransportError;
            }
        };

        match message {
            Message::Text(text) => {
                let Some(inbound) = parse_inbound(text.as_str()) else {
                    continue;
                };
                match state
                    .dispatch_event_usecase
                    .execute(&connection, inbound)
                    .await
                {
                    Ok(DispatchOutcome::CloseRequested) => return CloseReason::ClientRequested,
                    Ok(outcome) => tracing::debug!("Dispatched: {:?}", outcome),
                    Err(DispatchError::ConnectionNotOpen(_)) => return CloseReason::PeerClosed,
                    Err(e) => tracing::warn!("Rejected event from '{}': {}", connection.id(), e),
                }
            }
            Message::Binary(_) => {
                tracing::debug!("Ignored binary frame from '{}'", connection.id());
            }
            Message::Ping(_) | Message::Pong(_) => {
                // Ping/pong is handled automatically by the WebSocket protocol
            }
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", connection.id());
                return CloseReason::PeerClosed;
            }
        }
    }
    CloseReason::PeerClosed
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();

    // connect / 挨拶などはチャネルに積まれ、pusher が起動してから書き出される
    let (tx, rx) = outbound_channel();
    let connection = match state.open_session_usecase.execute(tx).await {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Failed to open session: {}", e);
            return;
        }
    };

    let mut send_task = pusher_loop(rx, sender);
    let mut recv_task = tokio::spawn(receive_loop(receiver, state.clone(), connection.clone()));

    let reason = tokio::select! {
        result = &mut recv_task => result.unwrap_or(CloseReason::TransportError),
        _ = &mut send_task => CloseReason::TransportError,
        _ = state.shutdown.cancelled() => CloseReason::ServerShutdown,
    };
    // 処理中の join などが close より後に Registry を触らないよう、終了まで待つ
    if !recv_task.is_finished() {
        recv_task.abort();
        let _ = (&mut recv_task).await;
    }

    state
        .close_session_usecase
        .execute(&connection, reason)
        .await;

    // クローズで送信チャネルが閉じるので、pusher は残りを書き出して終了する
    if !send_task.is_finished()
        && tokio::time::timeout(FLUSH_TIMEOUT, &mut send_task)
            .await
            .is_err()
    {
        tracing::debug!("Pusher for '{}' did not finish in time", connection.id());
        send_task.abort();
    }
}
