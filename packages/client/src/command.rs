//! Parsing of typed lines into client commands.
//!
//! - plain text: `myCustomEventClientSide` `{"msg": text}`
//! - `/join ROOM`, `/leave [ROOM]`
//! - `/emit NAME [JSON]`: server-side handlers only
//! - `/room ROOM NAME [JSON]`: relay to a room (sender excluded)
//! - `/all NAME [JSON]`: relay to every connection
//! - `/help`, `/quit`
//!
//! `JSON` that does not parse is sent as a plain string.

use kairo_server::infrastructure::dto::websocket::{ClientFrame, TargetDto};
use serde_json::{Value, json};
use thiserror::Error;

/// 平文入力を送るイベント名
pub const CLIENT_SIDE_EVENT: &str = "myCustomEventClientSide";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// サーバーへ送るフレーム
    Send(ClientFrame),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '/{0}' (try /help)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

pub fn parse_line(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Send(frame(
            CLIENT_SIDE_EVENT,
            json!({ "msg": line }),
            None,
        )));
    };

    let (name, args) = split_word(rest);
    match name {
        "join" => {
            let (room, _) = split_word(args);
            if room.is_empty() {
                return Err(CommandError::Usage("/join ROOM"));
            }
            Ok(Command::Send(frame("join", json!({ "room": room }), None)))
        }
        "leave" => {
            let (room, _) = split_word(args);
            let data = if room.is_empty() {
                Value::Null
            } else {
                json!({ "room": room })
            };
            Ok(Command::Send(frame("leave", data, None)))
        }
        "emit" => {
            let (event, data) = split_word(args);
            if event.is_empty() {
                return Err(CommandError::Usage("/emit NAME [JSON]"));
            }
            Ok(Command::Send(frame(event, parse_data(data), None)))
        }
        "room" => {
            let (room, args) = split_word(args);
            let (event, data) = split_word(args);
            if room.is_empty() || event.is_empty() {
                return Err(CommandError::Usage("/room ROOM NAME [JSON]"));
            }
            let target = TargetDto::Room {
                id: room.to_string(),
            };
            Ok(Command::Send(frame(event, parse_data(data), Some(target))))
        }
        "all" => {
            let (event, data) = split_word(args);
            if event.is_empty() {
                return Err(CommandError::Usage("/all NAME [JSON]"));
            }
            Ok(Command::Send(frame(
                event,
                parse_data(data),
                Some(TargetDto::All),
            )))
        }
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn frame(event: &str, data: Value, to: Option<TargetDto>) -> ClientFrame {
    ClientFrame {
        event: event.to_string(),
        data,
        to,
    }
}

/// 先頭の 1 語と残りに分ける
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn parse_data(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
