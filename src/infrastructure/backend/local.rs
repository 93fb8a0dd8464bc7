//! ローカル推論バックエンド
//!
//! ウィンドウ内の全ターンをロールラベル付きで 1 本のプロンプトに線形化し、
//! プロセス内のエンジンで制約付きサンプリング生成を行います。
//!
//! ## 設計ノート
//!
//! - 推論エンジンは [`InferenceEngine`] trait の背後にあり、本番実装は
//!   feature `local-gguf` の GGUF エンジン、テストはスクリプト化された
//!   エンジンを注入します。
//! - エンジンは単一の計算資源なので、並行する generate はエンジンの
//!   Mutex で直列化されます。
//! - リモートバリアントと異なり、失敗は代替テキストに握り潰さず
//!   [`GenerateError::Inference`] としてそのまま伝播します（ネットワークが
//!   絡まない以上、失敗はプログラミング/リソース上の欠陥）。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{BackendKind, BackendState, GenerateError, GenerationBackend, Turn};

use super::InitCell;

/// Inference engine errors.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("failed to load model resources: {0}")]
    Load(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// In-process text-completion engine.
///
/// `load` is called once, under the backend's initialization lock.
/// `complete` returns only the newly generated continuation of `prompt`,
/// bounded by `max_new_tokens` sampled tokens.
#[async_trait]
pub trait InferenceEngine: Send {
    async fn load(&mut self) -> Result<(), EngineError>;

    async fn complete(&mut self, prompt: &str, max_new_tokens: u32) -> Result<String, EngineError>;
}

/// Linearize a conversation window into a single prompt.
///
/// Each turn is prefixed by its role label, in order, and the prompt ends
/// with the assistant cue so the engine continues as the assistant.
pub(crate) fn build_prompt(window: &[Turn]) -> String {
    let mut prompt = String::new();
    for turn in window {
        prompt.push_str(turn.role.label());
        prompt.push_str(": ");
        prompt.push_str(&turn.text);
        prompt.push('\n');
    }
    prompt.push_str("AI:");
    prompt
}

/// ローカル推論バックエンド
pub struct LocalBackend {
    /// 推論エンジン（単一資源、generate はこの Mutex で直列化される）
    engine: Mutex<Box<dyn InferenceEngine>>,
    init: InitCell,
}

impl LocalBackend {
    /// 新しい LocalBackend を作成（エンジンは未ロード）
    pub fn new(engine: Box<dyn InferenceEngine>) -> Self {
        Self {
            engine: Mutex::new(engine),
            init: InitCell::new(),
        }
    }
}

#[async_trait]
impl GenerationBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn state(&self) -> BackendState {
        self.init.state().await
    }

    async fn initialize(&self) -> BackendState {
        self.init
            .run_once(|| async {
                tracing::info!("Loading local inference engine...");
                let mut engine = self.engine.lock().await;
                engine.load().await?;
                tracing::info!("Local inference engine ready");
                Ok::<(), EngineError>(())
            })
            .await
    }

    async fn generate(
        &self,
        window: &[Turn],
        max_new_tokens: u32,
    ) -> Result<String, GenerateError> {
        if self.init.state().await != BackendState::Ready {
            return Err(GenerateError::NotReady);
        }

        let prompt = build_prompt(window);
        let mut engine = self.engine.lock().await;
        let text = engine
            .complete(&prompt, max_new_tokens)
            .await
            .map_err(|e| GenerateError::Inference(e.to_string()))?;
        Ok(text.trim().to_string())
    }
}
