//! Shared harness for the integration tests: an in-process server on an
//! ephemeral port plus small WebSocket helpers.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use kairo_server::{
    config::SessionConfig,
    domain::{RoomId, RoomRegistry, SessionCounter},
    infrastructure::{dispatcher::FanoutDispatcher, registry::InMemoryRoomRegistry},
    ui::Server,
    usecase::{
        CloseSessionUseCase, DispatchEventUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        GetStatsUseCase, OpenSessionUseCase,
    },
};
use serde_json::{Value, json};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// デモイベントなしのデフォルト設定で起動
    pub async fn start() -> Self {
        Self::start_with(SessionConfig::new(room("room-1"))).await
    }

    pub async fn start_with(config: SessionConfig) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(InMemoryRoomRegistry::new());
        registry.declare(config.default_room.clone()).await;
        let dispatcher = Arc::new(FanoutDispatcher::new(registry.clone()));
        let counter = Arc::new(SessionCounter::new());

        let server = Server::new(
            Arc::new(OpenSessionUseCase::new(
                registry.clone(),
                dispatcher.clone(),
                counter.clone(),
                config.clone(),
            )),
            Arc::new(CloseSessionUseCase::new(
                registry.clone(),
                dispatcher.clone(),
                counter.clone(),
                config.clone(),
            )),
            Arc::new(DispatchEventUseCase::new(
                registry.clone(),
                dispatcher.clone(),
                config.clone(),
            )),
            Arc::new(GetRoomsUseCase::new(registry.clone())),
            Arc::new(GetRoomDetailUseCase::new(registry.clone())),
            Arc::new(GetStatsUseCase::new(registry.clone(), counter.clone())),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let shutdown = server.shutdown_token();
        let handle = tokio::spawn(async move {
            server.serve(listener).await.expect("Server error");
        });

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// 接続し、connect イベントの ID と接続時のイベントを読み終えた状態で返す
    pub async fn connect(&self) -> (Client, String) {
        let (mut client, _response) = connect_async(self.ws_url())
            .await
            .expect("Failed to connect");
        let connect = next_event(&mut client).await.expect("No connect event");
        assert_eq!(connect["event"], "connect");
        let id = connect["data"]["id"]
            .as_str()
            .expect("connect event without id")
            .to_string();
        // 挨拶とルーム参加通知
        wait_for(&mut client, "newUserConnect").await;
        wait_for(&mut client, "connectedRoom").await;
        (client, id)
    }

    /// シャットダウンしてサーバータスクの終了を待つ
    pub async fn stop(self) {
        self.shutdown.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

pub fn room(id: &str) -> RoomId {
    RoomId::new(id.to_string()).expect("valid room id")
}

/// 次のイベントフレームを読む（タイムアウト・切断時は `None`）
pub async fn next_event(client: &mut Client) -> Option<Value> {
    loop {
        let message = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .ok()??
            .ok()?;
        match message {
            Message::Text(text) => {
                return Some(serde_json::from_str(text.as_str()).expect("Invalid frame"));
            }
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// 指定した名前のイベントが届くまで読み進め、その data を返す
pub async fn wait_for(client: &mut Client, name: &str) -> Value {
    loop {
        let event = next_event(client)
            .await
            .unwrap_or_else(|| panic!("Stream ended while waiting for '{name}'"));
        if event["event"] == name {
            return event["data"].clone();
        }
    }
}

/// 短時間のうちに何も届かないことを確認する
pub async fn assert_silent(client: &mut Client) {
    let received = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(received.is_err(), "Unexpected frame: {:?}", received);
}

pub async fn emit(client: &mut Client, frame: Value) {
    client
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("Failed to send frame");
}

pub async fn emit_to_room(client: &mut Client, room_id: &str, event: &str, data: Value) {
    emit(
        client,
        json!({ "event": event, "data": data, "to": { "scope": "room", "id": room_id } }),
    )
    .await;
}
