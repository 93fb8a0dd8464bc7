//! UI 層（axum による HTTP / WebSocket サーバ）

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
