//! GenerationBackend 実装
//!
//! ドメイン層が定義する GenerationBackend trait の 3 バリアント実装を提供します。
//!
//! - `local`: プロセス内推論（エンジンは `InferenceEngine` trait の背後）
//! - `openai`: チャット補完 API（マルチターン、リモート）
//! - `gemini`: シングルターン API（直近の発話のみ、リモート）
//!
//! バリアントは起動時に [`build_backend`] で 1 つだけ構築され、
//! `Arc<dyn GenerationBackend>` として注入されます。

pub mod gemini;
pub mod local;
pub mod openai;

#[cfg(feature = "local-gguf")]
pub mod gguf;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::config::BackendConfig;
use crate::domain::{BackendKind, BackendState, GenerationBackend};

pub use gemini::SingleTurnBackend;
pub use local::{InferenceEngine, LocalBackend};
pub use openai::ChatCompletionBackend;

/// Fixed degraded-reply text returned by the remote variants when the
/// provider call fails. The local variant never uses it — local failures
/// propagate as errors.
pub const FALLBACK_TEXT: &str = "申し訳ございません。一時的なエラーが発生しました。";

/// Backend construction errors (fatal at startup, before serving traffic).
#[derive(Debug, Error)]
pub enum BackendBuildError {
    #[error(
        "MODEL_TYPE=local requires the `local-gguf` feature; \
         rebuild with `--features local-gguf` or choose a remote backend"
    )]
    LocalUnavailable,
    #[error("failed to construct HTTP client: {0}")]
    HttpClient(String),
}

/// Construct the backend variant selected by `config`.
///
/// Called exactly once at process startup. The returned backend is still
/// `Uninitialized`; the caller kicks off `initialize` asynchronously.
pub fn build_backend(
    config: &BackendConfig,
) -> Result<Arc<dyn GenerationBackend>, BackendBuildError> {
    match config.kind {
        BackendKind::Local => {
            #[cfg(feature = "local-gguf")]
            {
                let engine = gguf::GgufEngine::new(config.local.clone());
                Ok(Arc::new(LocalBackend::new(Box::new(engine))))
            }
            #[cfg(not(feature = "local-gguf"))]
            {
                Err(BackendBuildError::LocalUnavailable)
            }
        }
        BackendKind::ChatCompletionApi => {
            let backend = ChatCompletionBackend::new(config.openai.clone())
                .map_err(|e| BackendBuildError::HttpClient(e.to_string()))?;
            Ok(Arc::new(backend))
        }
        BackendKind::SingleTurnApi => {
            let backend = SingleTurnBackend::new(config.gemini.clone())
                .map_err(|e| BackendBuildError::HttpClient(e.to_string()))?;
            Ok(Arc::new(backend))
        }
    }
}

/// Initialization state machine shared by the three backend variants.
///
/// Observable state lives in an `RwLock` so `generate` can check it without
/// queuing behind an in-flight load; the load itself is serialized by a
/// separate lock, so at most one underlying load ever executes and
/// concurrent `initialize` callers wait for its outcome.
pub(crate) struct InitCell {
    state: RwLock<BackendState>,
    init_lock: Mutex<()>,
}

impl InitCell {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(BackendState::Uninitialized),
            init_lock: Mutex::new(()),
        }
    }

    pub(crate) async fn state(&self) -> BackendState {
        *self.state.read().await
    }

    /// Run `load` unless a previous run already reached `Ready` or `Failed`.
    pub(crate) async fn run_once<F, Fut, E>(&self, load: F) -> BackendState
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        let _guard = self.init_lock.lock().await;

        let current = *self.state.read().await;
        if matches!(current, BackendState::Ready | BackendState::Failed) {
            return current;
        }

        *self.state.write().await = BackendState::Initializing;
        let next = match load().await {
            Ok(()) => BackendState::Ready,
            Err(e) => {
                tracing::error!("Backend initialization failed: {}", e);
                BackendState::Failed
            }
        };
        *self.state.write().await = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_run_once_reaches_ready() {
        // テスト項目: ロード成功で Ready に遷移する
        // given (前提条件):
        let cell = InitCell::new();
        assert_eq!(cell.state().await, BackendState::Uninitialized);

        // when (操作):
        let result = cell.run_once(|| async { Ok::<(), String>(()) }).await;

        // then (期待する結果):
        assert_eq!(result, BackendState::Ready);
        assert_eq!(cell.state().await, BackendState::Ready);
    }

    #[tokio::test]
    async fn test_run_once_failure_is_terminal() {
        // テスト項目: ロード失敗で Failed に遷移し、再実行してもロードは走らない
        // given (前提条件):
        let cell = InitCell::new();
        let result = cell
            .run_once(|| async { Err::<(), String>("boom".to_string()) })
            .await;
        assert_eq!(result, BackendState::Failed);

        // when (操作): 再度 run_once を呼ぶ
        let calls = AtomicUsize::new(0);
        let result = cell
            .run_once(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<(), String>(())
            })
            .await;

        // then (期待する結果): Failed のまま、ロードは実行されない
        assert_eq!(result, BackendState::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_run_once_loads_at_most_once() {
        // テスト項目: 並行して initialize しても実際のロードは 1 回だけ実行される
        // given (前提条件):
        let cell = Arc::new(InitCell::new());
        let calls = Arc::new(AtomicUsize::new(0));

        // when (操作): 2 つのタスクが同時に run_once を呼ぶ
        let c1 = cell.clone();
        let n1 = calls.clone();
        let t1 = tokio::spawn(async move {
            c1.run_once(|| async {
                n1.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                Ok::<(), String>(())
            })
            .await
        });
        let c2 = cell.clone();
        let n2 = calls.clone();
        let t2 = tokio::spawn(async move {
            c2.run_once(|| async {
                n2.fetch_add(1, Ordering::SeqCst);
                Ok::<(), String>(())
            })
            .await
        });

        // then (期待する結果): 両者とも Ready を得るが、ロードは 1 回のみ
        assert_eq!(t1.await.unwrap(), BackendState::Ready);
        assert_eq!(t2.await.unwrap(), BackendState::Ready);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
