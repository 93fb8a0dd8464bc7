//! Per-connection conversation state.

use super::value_object::Role;

/// One attributed utterance in a conversation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Rolling transcript of human/AI turns for a single connection.
///
/// One session exists per Connection, not per Room — sessions are never
/// shared across connections even within the same room, so multiple humans
/// in one room each get an independent AI dialogue. Storage is append-only
/// and uncapped; bounding happens at read time via [`window`].
///
/// Turn alternation is conventional, not enforced: two consecutive human
/// turns are legal if the backend is slow.
///
/// [`window`]: ConversationSession::window
#[derive(Debug, Default)]
pub struct ConversationSession {
    turns: Vec<Turn>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. Pure append, no size cap.
    pub fn append(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn::new(role, text));
    }

    /// The last `n` turns, in order (fewer if the session is shorter).
    /// Used to bound the context sent to the generation backend.
    pub fn window(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
