//! UseCase 層
//!
//! ドメイン trait（RoomRegistry / ConnectionManager / GenerationBackend）の
//! 組み合わせとして、1 接続のライフサイクルとメッセージ処理のビジネス
//! ロジックを実装します。UI 層（axum ハンドラ）はトランスポートのみを担い、
//! ここに処理を委譲します。

mod connect_participant;
mod create_room;
mod disconnect_participant;
mod error;
mod get_room;
mod relay_message;

pub use connect_participant::ConnectParticipantUseCase;
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::RelayError;
pub use get_room::GetRoomUseCase;
pub use relay_message::RelayMessageUseCase;
