//! HTTP / WebSocket endpoint handlers.

mod http;
mod websocket;

pub use http::{create_room, debug_rooms, get_room, health_check};
pub use websocket::websocket_handler;
