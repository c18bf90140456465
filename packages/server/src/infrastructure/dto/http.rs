//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// `GET /api/rooms` の要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub members: Vec<String>,
    pub member_count: usize,
    pub retained: bool,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

/// `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub members: Vec<RoomMemberDto>,
    pub retained: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMemberDto {
    pub connection_id: String,
    pub connected_at: String,
}

/// `GET /api/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsDto {
    pub open_connections: usize,
    pub rooms: usize,
}
