//! Domain entities.

use serde::Serialize;

use super::value_object::RoomId;

/// A named broadcast domain.
///
/// `members` is advisory metadata written at creation time and never
/// reconciled with live connections; live presence belongs to the
/// ConnectionManager. Rooms have no destruction path — once created they
/// are retained for the process lifetime, even after every connection has
/// left.
#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub host_name: String,
    pub members: Vec<String>,
    /// Unix timestamp of creation (JST, milliseconds)
    pub created_at: i64,
}

impl Room {
    /// Create a room hosted by `host_name`. The host is the sole initial
    /// member.
    pub fn new(id: RoomId, host_name: String, created_at: i64) -> Self {
        let members = vec![host_name.clone()];
        Self {
            id,
            host_name,
            members,
            created_at,
        }
    }
}
