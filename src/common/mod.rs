//! Shared utilities used across layers and binaries.

pub mod logger;
pub mod time;
