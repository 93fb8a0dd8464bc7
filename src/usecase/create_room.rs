//! UseCase: ルーム作成処理

use std::sync::Arc;

use crate::domain::{Room, RoomRegistry};

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    /// RoomRegistry（ルームメタデータの抽象化）
    registry: Arc<dyn RoomRegistry>,
}

impl CreateRoomUseCase {
    /// 新しい CreateRoomUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ルーム作成を実行
    ///
    /// # Arguments
    ///
    /// * `host_name` - ホストの表示名。作成直後の唯一のメンバーになる
    ///
    /// # Returns
    ///
    /// 作成された Room（id は 128 bit ランダムトークン）
    pub async fn execute(&self, host_name: String) -> Room {
        self.registry.create_room(host_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::registry::InMemoryRoomRegistry;

    #[tokio::test]
    async fn test_create_room_returns_room_with_host() {
        // テスト項目: 作成された Room がホスト名と id を持つ
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let usecase = CreateRoomUseCase::new(registry.clone());

        // when (操作):
        let room = usecase.execute("Alice".to_string()).await;

        // then (期待する結果):
        assert_eq!(room.host_name, "Alice");
        assert_eq!(room.members, vec!["Alice".to_string()]);
        let fetched = registry.get_room(&room.id).await.unwrap();
        assert_eq!(fetched.id, room.id);
    }
}
