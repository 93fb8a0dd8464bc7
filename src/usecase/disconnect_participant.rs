//! UseCase: 参加者切断処理
//!
//! 接続の leave と、残った接続への退出通知のブロードキャストを行います。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionManager, RoomId};
use crate::infrastructure::dto::websocket::Envelope;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// ConnectionManager（ライブ接続とブロードキャストの抽象化）
    connections: Arc<dyn ConnectionManager>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(connections: Arc<dyn ConnectionManager>) -> Self {
        Self { connections }
    }

    /// 参加者切断を実行
    ///
    /// leave が先、通知が後。切断した本人は退出通知を受け取らない。
    pub async fn execute(&self, room_id: &RoomId, connection_id: ConnectionId, display_name: &str) {
        self.connections.leave(room_id, connection_id).await;

        let notice = Envelope::left_notice(display_name);
        let json = serde_json::to_string(&notice).unwrap();
        self.connections.broadcast(room_id, &json).await;

        tracing::info!("'{}' left room {}", display_name, room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PusherChannel;
    use crate::infrastructure::connection::ChannelConnectionManager;
    use tokio::sync::mpsc;

    fn test_channel() -> (PusherChannel, mpsc::UnboundedReceiver<String>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn test_disconnect_leaves_and_notifies_remaining() {
        // テスト項目: 切断した本人は退出通知を受け取らず、残りの接続が受け取る
        // given (前提条件): A と B が接続しているルーム
        let connections = Arc::new(ChannelConnectionManager::new());
        let usecase = DisconnectParticipantUseCase::new(connections.clone());
        let room_id = RoomId::generate();
        let conn_a = ConnectionId::generate();
        let (tx_a, mut rx_a) = test_channel();
        let (tx_b, mut rx_b) = test_channel();
        connections.join(room_id.clone(), conn_a, tx_a).await;
        connections.join(room_id.clone(), ConnectionId::generate(), tx_b).await;

        // when (操作): A が切断する
        usecase.execute(&room_id, conn_a, "Alice").await;

        // then (期待する結果): B のみが退出通知を受信する
        let to_b = rx_b.recv().await.unwrap();
        assert!(to_b.contains("Alice さんが退出しました。"));
        assert!(rx_a.try_recv().is_err());
        assert_eq!(connections.connection_count(&room_id).await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_last_connection_clears_room_entry() {
        // テスト項目: 最後の接続の切断で接続エントリが消える（Room メタデータは別管轄）
        // given (前提条件):
        let connections = Arc::new(ChannelConnectionManager::new());
        let usecase = DisconnectParticipantUseCase::new(connections.clone());
        let room_id = RoomId::generate();
        let conn = ConnectionId::generate();
        let (tx, _rx) = test_channel();
        connections.join(room_id.clone(), conn, tx).await;

        // when (操作):
        usecase.execute(&room_id, conn, "Alice").await;

        // then (期待する結果):
        assert_eq!(connections.connection_count(&room_id).await, 0);
    }
}
