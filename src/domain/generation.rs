//! GenerationBackend trait 定義
//!
//! テキスト生成バックエンドの共通コントラクトを定義します。
//! 3 つのバリアント（ローカル推論・チャット補完 API・シングルターン API）は
//! Infrastructure 層が実装し、起動時に 1 つだけ選択されます。

use async_trait::async_trait;
use thiserror::Error;

use super::session::Turn;

/// Which backend variant a process is configured with.
///
/// Selected once at startup and never changed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process constrained-sampling inference over a local model.
    Local,
    /// Remote multi-turn chat completion API (OpenAI-style).
    ChatCompletionApi,
    /// Remote single-turn API that ignores prior context (Gemini-style).
    SingleTurnApi,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BackendKind::Local => "local",
            BackendKind::ChatCompletionApi => "openai",
            BackendKind::SingleTurnApi => "gemini",
        };
        f.write_str(s)
    }
}

/// Backend initialization state machine.
///
/// `Uninitialized → Initializing → Ready | Failed`. Once `Ready` a backend
/// never returns to `Uninitialized`; `Failed` is terminal (restart the
/// process to recover).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// Generation errors.
///
/// The two remote variants swallow provider failures into a fixed apology
/// string, so `Inference` surfaces only from the local variant, where any
/// failure is a programming/resource defect, not a recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// `generate` was called before initialization reached `Ready`.
    #[error("generation backend is not ready")]
    NotReady,
    /// Local inference failure. Propagated uncaught.
    #[error("local inference error: {0}")]
    Inference(String),
}

/// Text generation capability.
///
/// Process-wide singleton selected by configuration before any connection
/// is served. The contract is identical across variants except for the
/// failure-propagation asymmetry: the local variant raises
/// [`GenerateError::Inference`], the remote variants degrade to apology
/// text. Callers treat both outcomes as "a string was produced, possibly an
/// apology" and only [`GenerateError`] ends a connection loop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// The variant this backend implements.
    fn kind(&self) -> BackendKind;

    /// Current initialization state.
    async fn state(&self) -> BackendState;

    /// Run the underlying load/handshake and return the resulting state.
    ///
    /// Idempotent: calling again after `Ready` or `Failed` returns the
    /// existing state without re-running the load. Safe to invoke
    /// concurrently with an in-flight initialization; at most one underlying
    /// load executes.
    async fn initialize(&self) -> BackendState;

    /// Generate a reply from a bounded window of conversation turns.
    ///
    /// # Errors
    ///
    /// [`GenerateError::NotReady`] unless the state is `Ready`;
    /// [`GenerateError::Inference`] from the local variant on any inference
    /// failure.
    async fn generate(&self, window: &[Turn], max_new_tokens: u32)
    -> Result<String, GenerateError>;
}
