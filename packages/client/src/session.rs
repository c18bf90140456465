//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use kairo_server::infrastructure::dto::websocket::EventFrame;
use kairo_shared::time::now_millis;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
};

use crate::{
    command::{Command, parse_line},
    error::ClientError,
    formatter::EventFormatter,
    ui::redisplay_prompt,
};

/// How a session ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// `/quit` or the input stream closed
    UserExit,
}

fn print_and_prompt(text: &str) {
    print!("{}", text);
    redisplay_prompt();
}

fn disconnect_reason_of(frame: &EventFrame) -> Option<String> {
    if frame.event != "disconnect" {
        return None;
    }
    frame.data.get("reason")?.as_str().map(str::to_string)
}

/// Run one WebSocket session until the user exits or the connection drops
///
/// # Arguments
///
/// * `url` - WebSocket endpoint (e.g. `ws://127.0.0.1:3000/ws`)
/// * `input` - Lines typed by the user; shared across reconnects
pub async fn run_client_session(
    url: &str,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<SessionEnd, ClientError> {
    let (ws_stream, _response) = connect_async(url).await.map_err(|e| match e {
        tungstenite::Error::Http(response) => {
            ClientError::Rejected(response.status().to_string())
        }
        other => ClientError::ConnectionError(other.to_string()),
    })?;

    tracing::info!("Connected to event room server!");
    println!("\nType a message and press Enter to send, /help for commands, Ctrl+C to exit.\n");

    let (mut write, mut read) = ws_stream.split();
    // サーバーが閉じる前に送ってきた disconnect の理由
    let mut disconnect_reason: Option<String> = None;

    loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<EventFrame>(text.as_str()) {
                        Ok(frame) => {
                            if let Some(reason) = disconnect_reason_of(&frame) {
                                disconnect_reason = Some(reason);
                            }
                            print_and_prompt(&EventFormatter::format_event(&frame, now_millis()));
                        }
                        Err(_) => print_and_prompt(&EventFormatter::format_raw_message(text.as_str())),
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    print_and_prompt(&EventFormatter::format_binary_message(data.len()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    return Err(match disconnect_reason.take() {
                        Some(reason) => ClientError::Disconnected(reason),
                        None => ClientError::ConnectionError("Connection closed".to_string()),
                    });
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
            },
            line = input.recv() => {
                let Some(line) = line else {
                    // Ctrl+C / Ctrl+D
                    write.send(Message::Close(None)).await.ok();
                    return Ok(SessionEnd::UserExit);
                };
                let frame = match parse_line(&line) {
                    Ok(Command::Send(frame)) => frame,
                    Ok(Command::Help) => {
                        print_and_prompt(&EventFormatter::format_help());
                        continue;
                    }
                    Ok(Command::Quit) => {
                        write.send(Message::Close(None)).await.ok();
                        return Ok(SessionEnd::UserExit);
                    }
                    Err(e) => {
                        print_and_prompt(&EventFormatter::format_error(&e.to_string()));
                        continue;
                    }
                };

                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to serialize frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json.into())).await {
                    tracing::warn!("Failed to send frame: {}", e);
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
                redisplay_prompt();
            }
        }
    }
}
