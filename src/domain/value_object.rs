//! Value objects for the chat relay domain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Room identifier.
///
/// An opaque 128-bit random token, globally unique and immutable after
/// creation. Generated once per room by [`RoomId::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(Uuid);

impl RoomId {
    /// Generate a fresh random room id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a room id from its string representation.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Connection identifier.
///
/// Identifies one live WebSocket connection inside the ConnectionManager.
/// Connection ids are never reused; each accepted socket gets a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Attribution of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Human,
    Assistant,
}

impl Role {
    /// Prompt label used when a conversation window is linearized into a
    /// single prompt for the local backend.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Human => "ユーザー",
            Role::Assistant => "AI",
        }
    }
}
