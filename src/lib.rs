//! AI chat relay server library.
//!
//! Room-scoped WebSocket chat relay that augments human messages with
//! responses from a configurable text-generation backend. Every inbound
//! message is broadcast verbatim to the whole room; chat messages
//! additionally drive a generation call against the sender's own
//! conversation session.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// process configuration (read once at startup)
pub mod config;

// shared library
pub mod common;
