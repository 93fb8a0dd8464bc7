//! UseCase: 参加者接続処理
//!
//! 接続の join 登録と、ルーム全体（新規接続自身を含む）への参加通知の
//! ブロードキャストを行います。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionManager, PusherChannel, RoomId};
use crate::infrastructure::dto::websocket::Envelope;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// ConnectionManager（ライブ接続とブロードキャストの抽象化）
    connections: Arc<dyn ConnectionManager>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(connections: Arc<dyn ConnectionManager>) -> Self {
        Self { connections }
    }

    /// 参加者接続を実行
    ///
    /// join は接続ライフサイクルにつき必ず 1 回だけ呼ばれる契約
    /// （ConnectionManager は重複登録を検出しない）。
    ///
    /// # Arguments
    ///
    /// * `room_id` - 参加先のルーム id
    /// * `connection_id` - この接続の id
    /// * `sender` - この接続へメッセージを push するチャンネル
    /// * `display_name` - 参加通知に使う表示名
    pub async fn execute(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        sender: PusherChannel,
        display_name: &str,
    ) {
        self.connections
            .join(room_id.clone(), connection_id, sender)
            .await;

        let notice = Envelope::joined_notice(display_name);
        let json = serde_json::to_string(&notice).unwrap();
        // 参加通知は新規接続自身を含むルーム全体に配送される
        self.connections.broadcast(&room_id, &json).await;

        tracing::info!("'{}' joined room {}", display_name, room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::connection::ChannelConnectionManager;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connect_joins_and_notifies_whole_room() {
        // テスト項目: join 後、参加通知が既存接続と新規接続の両方に届く
        // given (前提条件): 既存接続 A がいるルーム
        let connections = Arc::new(ChannelConnectionManager::new());
        let usecase = ConnectParticipantUseCase::new(connections.clone());
        let room_id = RoomId::generate();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        usecase.execute(room_id.clone(), ConnectionId::generate(), tx_a, "Alice").await;
        let _ = rx_a.recv().await; // Alice 自身の参加通知を読み捨てる

        // when (操作): B が参加する
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        usecase.execute(room_id.clone(), ConnectionId::generate(), tx_b, "Bob").await;

        // then (期待する結果): A と B の両方が Bob の参加通知を受信する
        let to_a = rx_a.recv().await.unwrap();
        let to_b = rx_b.recv().await.unwrap();
        assert!(to_a.contains("Bob さんが参加しました。"));
        assert_eq!(to_a, to_b);
        assert_eq!(connections.connection_count(&room_id).await, 2);
    }
}
