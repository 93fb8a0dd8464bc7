//! InMemory RoomRegistry 実装
//!
//! ドメイン層が定義する RoomRegistry trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 設計ノート
//!
//! Room に削除パスはありません。全ての接続が退出した後も Room メタデータは
//! プロセス終了まで保持されます。ルーム作成が続く限りメモリは単調増加します
//! （キャパシティプランニング上の既知の特性）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::common::time::get_jst_timestamp;
use crate::domain::{RegistryError, Room, RoomId, RoomRegistry};

/// インメモリ RoomRegistry 実装
pub struct InMemoryRoomRegistry {
    rooms: Mutex<HashMap<RoomId, Room>>,
}

impl InMemoryRoomRegistry {
    /// 新しい InMemoryRoomRegistry を作成
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn create_room(&self, host_name: String) -> Room {
        let id = RoomId::generate();
        let room = Room::new(id.clone(), host_name, get_jst_timestamp());

        let mut rooms = self.rooms.lock().await;
        rooms.insert(id.clone(), room.clone());
        tracing::info!(
            "Room {} created (host: '{}', total rooms: {})",
            id,
            room.host_name,
            rooms.len()
        );

        room
    }

    async fn get_room(&self, id: &RoomId) -> Result<Room, RegistryError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::RoomNotFound(id.to_string()))
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        rooms.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_room_stores_host_as_member() {
        // テスト項目: 作成した Room がホストをメンバーとして保持し、取得できる
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();

        // when (操作):
        let room = registry.create_room("Alice".to_string()).await;

        // then (期待する結果):
        let fetched = registry.get_room(&room.id).await.unwrap();
        assert_eq!(fetched.host_name, "Alice");
        assert_eq!(fetched.members, vec!["Alice".to_string()]);
    }

    #[tokio::test]
    async fn test_create_room_generates_unique_ids() {
        // テスト項目: 連続して作成した Room は異なる id を持つ
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();

        // when (操作):
        let a = registry.create_room("Alice".to_string()).await;
        let b = registry.create_room("Bob".to_string()).await;

        // then (期待する結果):
        assert_ne!(a.id, b.id);
        assert_eq!(registry.list_rooms().await.len(), 2);
    }

    #[tokio::test]
    async fn test_get_room_not_found() {
        // テスト項目: 存在しない Room の取得は RoomNotFound を返す
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();

        // when (操作):
        let result = registry.get_room(&RoomId::generate()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RegistryError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_rooms_are_never_deleted() {
        // テスト項目: Room に削除操作は存在せず、作成後は取得し続けられる
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let room = registry.create_room("Alice".to_string()).await;

        // when (操作): 何度取得しても
        for _ in 0..3 {
            let fetched = registry.get_room(&room.id).await;

            // then (期待する結果): 常に成功する
            assert!(fetched.is_ok());
        }
    }
}
