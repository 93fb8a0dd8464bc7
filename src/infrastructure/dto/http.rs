//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

use crate::common::time::timestamp_to_jst_rfc3339;
use crate::domain::Room;

/// Request body for `POST /rooms`.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub host_name: String,
}

/// Response body for room creation and lookup.
#[derive(Debug, Serialize)]
pub struct RoomInfoDto {
    pub room_id: String,
    pub host_name: String,
}

impl From<Room> for RoomInfoDto {
    fn from(room: Room) -> Self {
        Self {
            room_id: room.id.to_string(),
            host_name: room.host_name,
        }
    }
}

/// Debug snapshot of one room's metadata.
#[derive(Debug, Serialize)]
pub struct RoomDebugDto {
    pub room_id: String,
    pub host_name: String,
    pub members: Vec<String>,
    pub created_at: String,
}

impl From<Room> for RoomDebugDto {
    fn from(room: Room) -> Self {
        Self {
            room_id: room.id.to_string(),
            host_name: room.host_name,
            members: room.members,
            created_at: timestamp_to_jst_rfc3339(room.created_at),
        }
    }
}
