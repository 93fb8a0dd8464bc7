//! WebSocket envelope DTOs.
//!
//! The wire format is a JSON envelope `{type, name?, text?}`. Every envelope
//! a connection sends is relayed verbatim to the whole room; the server
//! additionally injects `system` envelopes on join/leave and AI-authored
//! `chat` envelopes after generation.

use serde::{Deserialize, Serialize};

/// Display name the server uses for generated replies.
pub const ASSISTANT_NAME: &str = "AI";

/// Declared envelope type.
///
/// Unknown declared types map to `Other` so they can still be relayed
/// without interpretation (relay-before-interpret).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeType {
    Chat,
    System,
    #[serde(other)]
    Other,
}

/// JSON envelope exchanged over the message channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub r#type: EnvelopeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Envelope {
    /// System notice broadcast when a participant joins.
    pub fn joined_notice(name: &str) -> Self {
        Self {
            r#type: EnvelopeType::System,
            name: None,
            text: Some(format!("{name} さんが参加しました。")),
        }
    }

    /// System notice broadcast when a participant leaves.
    pub fn left_notice(name: &str) -> Self {
        Self {
            r#type: EnvelopeType::System,
            name: None,
            text: Some(format!("{name} さんが退出しました。")),
        }
    }

    /// Chat envelope attributed to the assistant.
    pub fn assistant_chat(text: String) -> Self {
        Self {
            r#type: EnvelopeType::Chat,
            name: Some(ASSISTANT_NAME.to_string()),
            text: Some(text),
        }
    }
}
