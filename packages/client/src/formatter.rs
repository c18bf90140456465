//! Event formatting utilities for client display.

use kairo_server::infrastructure::dto::websocket::EventFrame;
use kairo_shared::time::millis_to_clock_time;
use serde_json::Value;

/// Event formatter for client display
pub struct EventFormatter;

impl EventFormatter {
    /// Format an event received from the server
    ///
    /// # Arguments
    ///
    /// * `frame` - The received event frame
    /// * `received_at` - Unix timestamp when the frame arrived (milliseconds)
    pub fn format_event(frame: &EventFrame, received_at: i64) -> String {
        let time = millis_to_clock_time(received_at);
        match frame.event.as_str() {
            "connect" => {
                let id = frame.data["id"].as_str().unwrap_or("?");
                format!("\n[{}] * connected as {}\n", time, id)
            }
            "disconnect" => {
                let reason = frame.data["reason"].as_str().unwrap_or("unknown");
                format!("\n[{}] * disconnected by server ({})\n", time, reason)
            }
            _ => format!(
                "\n[{}] {}: {}\n",
                time,
                frame.event,
                Self::format_data(&frame.data)
            ),
        }
    }

    /// `{"msg": ...}` / `{"des": ...}` と文字列はそのまま、それ以外は JSON で表示
    fn format_data(data: &Value) -> String {
        match data {
            Value::String(text) => text.clone(),
            Value::Object(fields) if fields.len() == 1 => {
                match fields.get("msg").or_else(|| fields.get("des")) {
                    Some(Value::String(text)) => text.clone(),
                    _ => data.to_string(),
                }
            }
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a client-side error (bad command, failed send)
    pub fn format_error(message: &str) -> String {
        format!("! {}\n", message)
    }

    pub fn format_help() -> String {
        [
            "",
            "  <text>                   send myCustomEventClientSide {\"msg\": <text>}",
            "  /join ROOM               move to ROOM",
            "  /leave [ROOM]            leave ROOM (default: current room)",
            "  /emit NAME [JSON]        send an event to the server",
            "  /room ROOM NAME [JSON]   relay an event to everyone else in ROOM",
            "  /all NAME [JSON]         relay an event to every connection",
            "  /quit                    exit",
            "",
        ]
        .join("\n")
    }
}
