//! ConnectionManager trait 定義
//!
//! ルーム単位のライブ接続とブロードキャストのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::value_object::{ConnectionId, RoomId};

/// Channel used to push messages to a single connection.
///
/// The receiving half is drained by that connection's pusher task, which
/// forwards each message to the WebSocket sink. Because the channel is
/// unbounded, a stalled client accumulates a queue instead of delaying
/// delivery to the rest of the room.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Live-connection bookkeeping and fan-out broadcast, per room.
///
/// The implementation owns all mutation of its per-room connection sets;
/// callers never see the underlying containers, and concurrent
/// `join`/`leave`/`broadcast` calls never observe a torn set.
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    /// Register `sender` under `room_id`.
    ///
    /// Appends without de-duplication: joining the same connection twice
    /// would double-deliver every broadcast. The message router calls this
    /// exactly once per connection lifecycle.
    async fn join(&self, room_id: RoomId, connection_id: ConnectionId, sender: PusherChannel);

    /// Remove the connection from the room's set. When the set empties, the
    /// room's connection-set entry is dropped (the Room metadata in the
    /// registry is unaffected). Unknown connection or room is a no-op.
    async fn leave(&self, room_id: &RoomId, connection_id: ConnectionId);

    /// Deliver `message` to every connection currently registered for
    /// `room_id`, in registration order, sequentially. A failed send to one
    /// connection is logged and skipped; it never aborts delivery to the
    /// remaining connections. Unknown room is a no-op.
    async fn broadcast(&self, room_id: &RoomId, message: &str);

    /// Number of live connections in the room (0 if the room has none).
    async fn connection_count(&self, room_id: &RoomId) -> usize;
}
