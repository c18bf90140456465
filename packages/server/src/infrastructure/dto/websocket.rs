//! WebSocket frame DTOs.
//!
//! テキストフレーム 1 枚が JSON オブジェクト 1 つに対応します。
//!
//! - サーバー → クライアント: `{"event": "...", "data": ...}`
//! - クライアント → サーバー: `{"event": "...", "data": ..., "to": {...}}`（`to` は省略可）

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// サーバーから送るイベントフレーム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// クライアントから受け取るイベントフレーム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<TargetDto>,
}

/// 中継先の指定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "kebab-case")]
pub enum TargetDto {
    /// 特定の接続
    Connection { id: String },
    /// ルームのメンバー（送信者を除く）
    Room { id: String },
    /// 送信者を含む全接続
    All,
    /// 送信者以外の全接続
    Others,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_frame_without_target() {
        // テスト項目: `to` を省略したフレームを受け付ける
        // given (前提条件):
        let text = r#"{"event":"myCustomEventClientSide","data":{"msg":"hi"}}"#;

        // when (操作):
        let frame: ClientFrame = serde_json::from_str(text).unwrap();

        // then (期待する結果):
        assert_eq!(frame.event, "myCustomEventClientSide");
        assert_eq!(frame.data, json!({ "msg": "hi" }));
        assert_eq!(frame.to, None);
    }

    #[test]
    fn test_client_frame_without_data() {
        // テスト項目: `data` を省略すると null として扱う
        // given (前提条件):
        let text = r#"{"event":"ping"}"#;

        // when (操作):
        let frame: ClientFrame = serde_json::from_str(text).unwrap();

        // then (期待する結果):
        assert_eq!(frame.data, Value::Null);
    }

    #[test]
    fn test_target_scopes() {
        // テスト項目: 各スコープの JSON 表現
        // given (前提条件):
        let cases = [
            (json!({ "scope": "connection", "id": "c-1" }), TargetDto::Connection { id: "c-1".to_string() }),
            (json!({ "scope": "room", "id": "lobby" }), TargetDto::Room { id: "lobby".to_string() }),
            (json!({ "scope": "all" }), TargetDto::All),
            (json!({ "scope": "others" }), TargetDto::Others),
        ];

        for (value, expected) in cases {
            // when (操作):
            let target: TargetDto = serde_json::from_value(value).unwrap();

            // then (期待する結果):
            assert_eq!(target, expected);
        }
    }

    #[test]
    fn test_unknown_scope_is_rejected() {
        // テスト項目: 未知のスコープはパースエラー
        // given (前提条件):
        let text = r#"{"event":"x","to":{"scope":"galaxy"}}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientFrame>(text);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_event_frame_shape() {
        // テスト項目: サーバーからのフレームは event / data の 2 キー
        // given (前提条件):
        let frame = EventFrame {
            event: "connectedRoom".to_string(),
            data: json!("You are connected to room room-1"),
        };

        // when (操作):
        let value = serde_json::to_value(&frame).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({ "event": "connectedRoom", "data": "You are connected to room room-1" })
        );
    }
}
