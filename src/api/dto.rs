//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// ROOM DTOs
// ============================================

/// Room creation request
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    /// Room name, surrounding whitespace is ignored
    pub name: String,
    /// Maximum number of members (at least 1)
    pub capacity: i64,
}

/// Room entry in the directory listing
#[derive(Debug, Serialize)]
pub struct RoomSummary {
    pub name: String,
    pub capacity: usize,
    /// Current member count
    pub members: usize,
    pub created_at: DateTime<Utc>,
}

/// Room directory
#[derive(Debug, Serialize)]
pub struct RoomListResponse {
    /// Room used when a client does not name one
    pub default_room: String,
    pub total: usize,
    pub rooms: Vec<RoomSummary>,
}

/// Single room with its members
#[derive(Debug, Serialize)]
pub struct RoomDetail {
    pub name: String,
    pub capacity: usize,
    /// Member nicknames, sorted
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================
// WEBSOCKET DTOs
// ============================================

/// Query parameters of `GET /ws`
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Room to join (default room when absent or blank)
    #[serde(default)]
    pub room: Option<String>,
    /// Nickname ("Anonymous" when absent or blank)
    #[serde(default)]
    pub nick: Option<String>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    pub rooms: usize,
    pub sessions: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_room_request_deserialize() {
        let json = r#"{"name": "rust", "capacity": 12}"#;
        let req: CreateRoomRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.name, "rust");
        assert_eq!(req.capacity, 12);
    }

    #[test]
    fn test_connect_params_optional() {
        let params: ConnectParams = serde_json::from_str("{}").unwrap();
        assert!(params.room.is_none());
        assert!(params.nick.is_none());
    }

    #[test]
    fn test_room_summary_serialize() {
        let summary = RoomSummary {
            name: "general".to_string(),
            capacity: 100,
            members: 3,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"name\":\"general\""));
        assert!(json.contains("\"members\":3"));
        assert!(json.contains("\"created_at\""));
    }
}
