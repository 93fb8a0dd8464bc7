//! ConnectionManager 実装
//!
//! - `channel`: tokio の unbounded channel を使った実装

pub mod channel;

pub use channel::ChannelConnectionManager;
