//! tokio チャンネルを使った ConnectionManager 実装
//!
//! ## 責務
//!
//! - ルーム単位のライブ接続（`UnboundedSender`）の管理
//! - 接続の join / leave と、登録順でのブロードキャスト
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! sender は unbounded なので送信がブロックすることはなく、受信側の pusher
//! タスクが WebSocket sink への書き込みを担います。停止したクライアントは
//! 自分のキューに溜め込むだけで、ルーム全体の配送を遅延させません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, ConnectionManager, PusherChannel, RoomId};

struct RoomConnection {
    id: ConnectionId,
    sender: PusherChannel,
}

/// tokio チャンネルベースの ConnectionManager 実装
///
/// Key: RoomId, Value: 登録順の接続リスト
pub struct ChannelConnectionManager {
    rooms: Mutex<HashMap<RoomId, Vec<RoomConnection>>>,
}

impl ChannelConnectionManager {
    /// 新しい ChannelConnectionManager を作成
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for ChannelConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionManager for ChannelConnectionManager {
    async fn join(&self, room_id: RoomId, connection_id: ConnectionId, sender: PusherChannel) {
        let mut rooms = self.rooms.lock().await;
        let connections = rooms.entry(room_id.clone()).or_default();
        // 同一接続の二重 join は検出しない（呼び出し側が 1 回だけ呼ぶ契約）
        connections.push(RoomConnection {
            id: connection_id,
            sender,
        });
        tracing::debug!(
            "Connection '{}' joined room {} ({} connection(s))",
            connection_id,
            room_id,
            connections.len()
        );
    }

    async fn leave(&self, room_id: &RoomId, connection_id: ConnectionId) {
        let mut rooms = self.rooms.lock().await;
        let Some(connections) = rooms.get_mut(room_id) else {
            tracing::warn!(
                "Connection '{}' left unknown room {}, skipping",
                connection_id,
                room_id
            );
            return;
        };

        connections.retain(|c| c.id != connection_id);
        tracing::debug!(
            "Connection '{}' left room {} ({} connection(s) remaining)",
            connection_id,
            room_id,
            connections.len()
        );

        // 最後の接続が退出したらエントリごと削除する
        // （RoomRegistry 側の Room メタデータには影響しない）
        if connections.is_empty() {
            rooms.remove(room_id);
            tracing::debug!("Room {} has no connections, entry removed", room_id);
        }
    }

    async fn broadcast(&self, room_id: &RoomId, message: &str) {
        let rooms = self.rooms.lock().await;
        let Some(connections) = rooms.get(room_id) else {
            return;
        };

        // 登録順に順次配送。1 接続への送信失敗は記録して読み飛ばす
        for connection in connections {
            if let Err(e) = connection.sender.send(message.to_string()) {
                tracing::warn!(
                    "Failed to push message to connection '{}' in room {}: {}",
                    connection.id,
                    room_id,
                    e
                );
            }
        }
    }

    async fn connection_count(&self, room_id: &RoomId) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map(|c| c.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - join / leave / broadcast の組み合わせに対する配送先の正確さ
    // - 最後の接続の leave でルームのエントリが削除されること
    // - 送信失敗（受信側 drop）があっても残りの接続へ配送されること
    //
    // 【なぜこのテストが必要か】
    // - ブロードキャストの対象集合は「join 済みかつ未 leave の接続」と
    //   厳密に一致しなければならない（他ルームとのインターリーブを含む）
    // - 配送は at-most-once・ベストエフォートであり、1 接続の失敗が
    //   他の接続への配送を壊してはならない
    //
    // 【どのようなシナリオをテストするか】
    // 1. 単一ルームでの join → broadcast
    // 2. leave 後の接続に配送されないこと
    // 3. 複数ルームのインターリーブ
    // 4. 受信側が drop された接続があっても配送が継続されること
    // 5. 最後の leave でエントリが削除されること
    // ========================================

    fn test_channel() -> (PusherChannel, mpsc::UnboundedReceiver<String>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_joined_connections() {
        // テスト項目: join 済みの全接続にブロードキャストが届く
        // given (前提条件):
        let manager = ChannelConnectionManager::new();
        let room = RoomId::generate();
        let (tx_a, mut rx_a) = test_channel();
        let (tx_b, mut rx_b) = test_channel();
        manager.join(room.clone(), ConnectionId::generate(), tx_a).await;
        manager.join(room.clone(), ConnectionId::generate(), tx_b).await;

        // when (操作):
        manager.broadcast(&room, "hello").await;

        // then (期待する結果):
        assert_eq!(rx_a.recv().await, Some("hello".to_string()));
        assert_eq!(rx_b.recv().await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_skips_left_connections() {
        // テスト項目: leave 済みの接続にはブロードキャストされない
        // given (前提条件):
        let manager = ChannelConnectionManager::new();
        let room = RoomId::generate();
        let (tx_a, mut rx_a) = test_channel();
        let (tx_b, mut rx_b) = test_channel();
        let conn_a = ConnectionId::generate();
        manager.join(room.clone(), conn_a, tx_a).await;
        manager.join(room.clone(), ConnectionId::generate(), tx_b).await;

        // when (操作): A が退出してからブロードキャスト
        manager.leave(&room, conn_a).await;
        manager.broadcast(&room, "after-leave").await;

        // then (期待する結果): B のみ受信する
        assert_eq!(rx_b.recv().await, Some("after-leave".to_string()));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_is_scoped_to_room() {
        // テスト項目: 別ルームの接続には配送されない（ルーム間インターリーブ）
        // given (前提条件):
        let manager = ChannelConnectionManager::new();
        let room_1 = RoomId::generate();
        let room_2 = RoomId::generate();
        let (tx_1, mut rx_1) = test_channel();
        let (tx_2, mut rx_2) = test_channel();
        manager.join(room_1.clone(), ConnectionId::generate(), tx_1).await;
        manager.join(room_2.clone(), ConnectionId::generate(), tx_2).await;

        // when (操作):
        manager.broadcast(&room_1, "only-room-1").await;

        // then (期待する結果):
        assert_eq!(rx_1.recv().await, Some("only-room-1".to_string()));
        assert!(rx_2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_survives_dropped_receiver() {
        // テスト項目: 受信側が drop された接続があっても残りに配送される
        // given (前提条件):
        let manager = ChannelConnectionManager::new();
        let room = RoomId::generate();
        let (tx_dead, rx_dead) = test_channel();
        let (tx_live, mut rx_live) = test_channel();
        manager.join(room.clone(), ConnectionId::generate(), tx_dead).await;
        manager.join(room.clone(), ConnectionId::generate(), tx_live).await;
        drop(rx_dead); // 送信失敗を発生させる

        // when (操作):
        manager.broadcast(&room, "still-delivered").await;

        // then (期待する結果): 登録順で後ろの接続にも届く
        assert_eq!(rx_live.recv().await, Some("still-delivered".to_string()));
    }

    #[tokio::test]
    async fn test_last_leave_removes_room_entry() {
        // テスト項目: 最後の接続の leave でルームの接続エントリが削除される
        // given (前提条件):
        let manager = ChannelConnectionManager::new();
        let room = RoomId::generate();
        let (tx, _rx) = test_channel();
        let conn = ConnectionId::generate();
        manager.join(room.clone(), conn, tx).await;
        assert_eq!(manager.connection_count(&room).await, 1);

        // when (操作):
        manager.leave(&room, conn).await;

        // then (期待する結果):
        assert_eq!(manager.connection_count(&room).await, 0);
        let rooms = manager.rooms.lock().await;
        assert!(!rooms.contains_key(&room));
    }

    #[tokio::test]
    async fn test_leave_unknown_room_is_noop() {
        // テスト項目: 存在しないルームからの leave は何もしない
        // given (前提条件):
        let manager = ChannelConnectionManager::new();

        // when (操作):
        manager.leave(&RoomId::generate(), ConnectionId::generate()).await;

        // then (期待する結果): パニックせず、状態も変わらない
        let rooms = manager.rooms.lock().await;
        assert!(rooms.is_empty());
    }

    #[tokio::test]
    async fn test_double_join_double_delivers() {
        // テスト項目: 同一 sender の二重 join は二重配送になる（重複排除しない契約）
        // given (前提条件):
        let manager = ChannelConnectionManager::new();
        let room = RoomId::generate();
        let (tx, mut rx) = test_channel();
        let conn = ConnectionId::generate();
        manager.join(room.clone(), conn, tx.clone()).await;
        manager.join(room.clone(), conn, tx).await;

        // when (操作):
        manager.broadcast(&room, "twice").await;

        // then (期待する結果): 2 回届く
        assert_eq!(rx.recv().await, Some("twice".to_string()));
        assert_eq!(rx.recv().await, Some("twice".to_string()));
    }
}
