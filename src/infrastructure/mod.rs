//! Infrastructure 層
//!
//! ドメイン層が定義する trait の具体的な実装を提供します。
//!
//! - `registry`: インメモリの RoomRegistry 実装
//! - `connection`: tokio チャンネルベースの ConnectionManager 実装
//! - `backend`: 3 バリアントの GenerationBackend 実装
//! - `dto`: HTTP / WebSocket の DTO

pub mod backend;
pub mod connection;
pub mod dto;
pub mod registry;
