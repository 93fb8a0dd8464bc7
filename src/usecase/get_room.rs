//! UseCase: ルーム取得処理

use std::sync::Arc;

use crate::domain::{RegistryError, Room, RoomId, RoomRegistry};

/// ルーム取得のユースケース
pub struct GetRoomUseCase {
    /// RoomRegistry（ルームメタデータの抽象化）
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomUseCase {
    /// 新しい GetRoomUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ルーム取得を実行
    ///
    /// パスパラメータ等から来る文字列 id を受け取り、形式不正も含めて
    /// 「存在しない」として扱います（ユーザー向けには 404 相当）。
    pub async fn execute(&self, room_id: &str) -> Result<Room, RegistryError> {
        let id = RoomId::parse(room_id)
            .map_err(|_| RegistryError::RoomNotFound(room_id.to_string()))?;
        self.registry.get_room(&id).await
    }

    /// 全ルームのスナップショットを取得（デバッグ用）
    pub async fn list(&self) -> Vec<Room> {
        self.registry.list_rooms().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::registry::InMemoryRoomRegistry;

    #[tokio::test]
    async fn test_get_existing_room() {
        // テスト項目: 作成済みの Room を文字列 id で取得できる
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let room = registry.create_room("Alice".to_string()).await;
        let usecase = GetRoomUseCase::new(registry);

        // when (操作):
        let fetched = usecase.execute(&room.id.to_string()).await;

        // then (期待する結果):
        assert_eq!(fetched.unwrap().host_name, "Alice");
    }

    #[tokio::test]
    async fn test_get_unknown_room_is_not_found() {
        // テスト項目: 存在しない id は RoomNotFound になる
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let usecase = GetRoomUseCase::new(registry);

        // when (操作):
        let result = usecase
            .execute("00000000-0000-0000-0000-000000000000")
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RegistryError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_malformed_room_id_is_not_found() {
        // テスト項目: 形式不正な id も RoomNotFound として扱う
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let usecase = GetRoomUseCase::new(registry);

        // when (操作):
        let result = usecase.execute("not-a-uuid").await;

        // then (期待する結果):
        assert!(matches!(result, Err(RegistryError::RoomNotFound(_))));
    }
}
