//! ドメイン層
//!
//! チャットリレーの中核となる型と能力（capability）trait を定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

pub mod connection;
pub mod entity;
pub mod generation;
pub mod registry;
pub mod session;
pub mod value_object;

pub use connection::{ConnectionManager, PusherChannel};
pub use entity::Room;
pub use generation::{BackendKind, BackendState, GenerateError, GenerationBackend};
#[cfg(test)]
pub use generation::MockGenerationBackend;
pub use registry::{RegistryError, RoomRegistry};
pub use session::{ConversationSession, Turn};
pub use value_object::{ConnectionId, Role, RoomId};
