//! Conversion logic between DTOs and domain entities.

use kairo_shared::time::millis_to_rfc3339;

use crate::domain::{
    ConnectionId, Event, EventTarget, InboundEvent, RoomId, RoomMember, RoomSnapshot,
    ValueObjectError,
};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<dto::EventFrame> for Event {
    type Error = ValueObjectError;

    fn try_from(frame: dto::EventFrame) -> Result<Self, Self::Error> {
        Event::named(frame.event, frame.data)
    }
}

impl TryFrom<dto::TargetDto> for EventTarget {
    type Error = ValueObjectError;

    fn try_from(target: dto::TargetDto) -> Result<Self, Self::Error> {
        Ok(match target {
            dto::TargetDto::Connection { id } => Self::Connection(ConnectionId::new(id)?),
            dto::TargetDto::Room { id } => Self::Room(RoomId::new(id)?),
            dto::TargetDto::All => Self::All,
            dto::TargetDto::Others => Self::Others,
        })
    }
}

impl TryFrom<dto::ClientFrame> for InboundEvent {
    type Error = ValueObjectError;

    fn try_from(frame: dto::ClientFrame) -> Result<Self, Self::Error> {
        let event = Event::named(frame.event, frame.data)?;
        let target = frame.to.map(EventTarget::try_from).transpose()?;
        Ok(Self { event, target })
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<Event> for dto::EventFrame {
    fn from(event: Event) -> Self {
        Self {
            event: event.name.into_string(),
            data: event.payload,
        }
    }
}

impl From<RoomMember> for http::RoomMemberDto {
    fn from(member: RoomMember) -> Self {
        Self {
            connection_id: member.id.into_string(),
            connected_at: millis_to_rfc3339(member.connected_at.value()),
        }
    }
}

impl From<RoomSnapshot> for http::RoomSummaryDto {
    fn from(room: RoomSnapshot) -> Self {
        Self {
            member_count: room.member_count(),
            members: room
                .members
                .into_iter()
                .map(|member| member.id.into_string())
                .collect(),
            retained: room.retained,
            created_at: millis_to_rfc3339(room.created_at.value()),
            id: room.id.into_string(),
        }
    }
}

impl From<RoomSnapshot> for http::RoomDetailDto {
    fn from(room: RoomSnapshot) -> Self {
        Self {
            id: room.id.into_string(),
            members: room.members.into_iter().map(Into::into).collect(),
            retained: room.retained,
            created_at: millis_to_rfc3339(room.created_at.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use serde_json::json;

    fn snapshot() -> RoomSnapshot {
        RoomSnapshot {
            id: RoomId::new("room-1".to_string()).unwrap(),
            members: vec![
                RoomMember {
                    id: ConnectionId::new("alice".to_string()).unwrap(),
                    connected_at: Timestamp::new(1_672_531_200_123),
                },
                RoomMember {
                    id: ConnectionId::new("bob".to_string()).unwrap(),
                    connected_at: Timestamp::new(1_672_531_201_000),
                },
            ],
            created_at: Timestamp::new(1_672_531_200_000),
            retained: true,
        }
    }

    #[test]
    fn test_event_to_frame() {
        // テスト項目: ドメインの Event が EventFrame に変換される
        // given (前提条件):
        let event = Event::named("myCustomEvent", json!({ "des": "hi" })).unwrap();

        // when (操作):
        let frame: dto::EventFrame = event.into();

        // then (期待する結果):
        assert_eq!(frame.event, "myCustomEvent");
        assert_eq!(frame.data, json!({ "des": "hi" }));
    }

    #[test]
    fn test_frame_with_invalid_name_is_rejected() {
        // テスト項目: 空のイベント名を持つフレームはドメインに変換できない
        // given (前提条件):
        let frame = dto::EventFrame {
            event: String::new(),
            data: json!(null),
        };

        // when (操作):
        let result = Event::try_from(frame);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_client_frame_to_inbound_event() {
        // テスト項目: ClientFrame が中継先付きの InboundEvent に変換される
        // given (前提条件):
        let frame = dto::ClientFrame {
            event: "chat".to_string(),
            data: json!({ "msg": "hi" }),
            to: Some(dto::TargetDto::Room {
                id: "lobby".to_string(),
            }),
        };

        // when (操作):
        let inbound = InboundEvent::try_from(frame).unwrap();

        // then (期待する結果):
        assert_eq!(inbound.event.name.as_str(), "chat");
        assert_eq!(
            inbound.target,
            Some(EventTarget::Room(RoomId::new("lobby".to_string()).unwrap()))
        );
    }

    #[test]
    fn test_client_frame_with_blank_target_is_rejected() {
        // テスト項目: 空のルーム ID を指定したフレームは変換できない
        // given (前提条件):
        let frame = dto::ClientFrame {
            event: "chat".to_string(),
            data: json!(null),
            to: Some(dto::TargetDto::Room { id: "  ".to_string() }),
        };

        // when (操作):
        let result = InboundEvent::try_from(frame);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::RoomIdEmpty));
    }

    #[test]
    fn test_snapshot_to_summary() {
        // テスト項目: RoomSnapshot がルーム一覧の要素に変換される
        // given (前提条件):
        let room = snapshot();

        // when (操作):
        let summary: http::RoomSummaryDto = room.into();

        // then (期待する結果):
        assert_eq!(summary.id, "room-1");
        assert_eq!(summary.members, vec!["alice", "bob"]);
        assert_eq!(summary.member_count, 2);
        assert!(summary.retained);
        assert_eq!(summary.created_at, "2023-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_snapshot_to_detail() {
        // テスト項目: RoomSnapshot がルーム詳細に変換され、接続時刻が RFC 3339 になる
        // given (前提条件):
        let room = snapshot();

        // when (操作):
        let detail: http::RoomDetailDto = room.into();

        // then (期待する結果):
        assert_eq!(detail.members.len(), 2);
        assert_eq!(detail.members[0].connection_id, "alice");
        assert_eq!(detail.members[0].connected_at, "2023-01-01T00:00:00.123Z");
    }
}
