//! RoomRegistry trait 定義
//!
//! ドメイン層が必要とするルームメタデータへのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use thiserror::Error;

use super::{entity::Room, value_object::RoomId};

/// Room registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Lookup for a room id that was never created.
    #[error("room not found: {0}")]
    RoomNotFound(String),
}

/// Room registry capability.
///
/// Pure metadata store: rooms are created once, looked up by id, and never
/// updated or deleted. The `members` list is write-once advisory data — the
/// registry does not track live presence.
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Create a room hosted by `host_name` and return it. Generates a fresh
    /// unique [`RoomId`].
    async fn create_room(&self, host_name: String) -> Room;

    /// Look up a room by id.
    ///
    /// # Errors
    ///
    /// [`RegistryError::RoomNotFound`] if no room with this id exists.
    async fn get_room(&self, id: &RoomId) -> Result<Room, RegistryError>;

    /// Snapshot of all rooms (debug endpoint only).
    async fn list_rooms(&self) -> Vec<Room>;
}
