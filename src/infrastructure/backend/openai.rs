//! チャット補完 API バックエンド（OpenAI スタイル）
//!
//! ウィンドウ内の全ターンをロール付きメッセージ列に写像し、1 回の
//! マルチターンリクエストを発行します。リモート失敗（タイムアウト、
//! クォータ、不正なレスポンス）は例外にせず、固定の謝罪テキストに
//! 置き換えます — ローカルバリアントと意図的に非対称です。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OpenAiConfig;
use crate::domain::{BackendKind, BackendState, GenerateError, GenerationBackend, Role, Turn};

use super::{FALLBACK_TEXT, InitCell};

/// リクエストタイムアウト
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, PartialEq, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Map a conversation window onto role-tagged API messages, preserving
/// order: human → `user`, assistant → `assistant`.
fn build_messages(window: &[Turn]) -> Vec<ApiMessage<'_>> {
    window
        .iter()
        .map(|turn| ApiMessage {
            role: match turn.role {
                Role::Human => "user",
                Role::Assistant => "assistant",
            },
            content: &turn.text,
        })
        .collect()
}

/// チャット補完 API バックエンド
pub struct ChatCompletionBackend {
    config: OpenAiConfig,
    client: reqwest::Client,
    init: InitCell,
}

impl ChatCompletionBackend {
    /// 新しい ChatCompletionBackend を作成（API キーの検証は initialize で行う）
    pub fn new(config: OpenAiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            config,
            client,
            init: InitCell::new(),
        })
    }

    async fn request_completion(
        &self,
        window: &[Turn],
        max_new_tokens: u32,
    ) -> Result<String, String> {
        // initialize が API キーの存在を検証済み
        let api_key = self.config.api_key.as_deref().ok_or("API key missing")?;

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: build_messages(window),
            max_tokens: max_new_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| e.to_string())?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or("response contained no choices")?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl GenerationBackend for ChatCompletionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ChatCompletionApi
    }

    async fn state(&self) -> BackendState {
        self.init.state().await
    }

    async fn initialize(&self) -> BackendState {
        self.init
            .run_once(|| async {
                if self.config.api_key.is_none() {
                    return Err("OPENAI_API_KEY is required for the chat completion backend");
                }
                tracing::info!(
                    "Chat completion backend ready (model: {})",
                    self.config.model
                );
                Ok(())
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

        // リモート失敗はここで握り潰し、固定の謝罪テキストに置き換える
        match self.request_completion(window, max_new_tokens).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!("Chat completion API error: {}", e);
                Ok(FALLBACK_TEXT.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> OpenAiConfig {
        OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            ..OpenAiConfig::default()
        }
    }

    #[test]
    fn test_build_messages_maps_roles_in_order() {
        // テスト項目: 全ターンがロール付きメッセージに順序通り写像される
        // given (前提条件):
        let window = vec![
            Turn::new(Role::Human, "こんにちは"),
            Turn::new(Role::Assistant, "はい"),
            Turn::new(Role::Human, "質問です"),
        ];

        // when (操作):
        let messages = build_messages(&window);

        // then (期待する結果):
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "こんにちは");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[1].content, "はい");
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[2].content, "質問です");
    }

    #[test]
    fn test_request_body_serialization() {
        // テスト項目: リクエストボディが API の期待する JSON になる
        // given (前提条件):
        let window = vec![Turn::new(Role::Human, "hi")];
        let body = ChatCompletionRequest {
            model: "gpt-3.5-turbo",
            messages: build_messages(&window),
            max_tokens: 128,
            temperature: 0.7,
            top_p: 0.9,
        };

        // when (操作):
        let json = serde_json::to_value(&body).unwrap();

        // then (期待する結果):
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["max_tokens"], 128);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_response_parsing() {
        // テスト項目: レスポンス JSON から先頭の choice が取り出せる
        // given (前提条件):
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "こんにちは！"}}
            ]
        }"#;

        // when (操作):
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        let content = parsed.choices.into_iter().next().unwrap().message.content;
        assert_eq!(content.as_deref(), Some("こんにちは！"));
    }

    #[tokio::test]
    async fn test_generate_before_initialize_fails_not_ready() {
        // テスト項目: initialize 前の generate は NotReady で失敗する
        // given (前提条件):
        let backend = ChatCompletionBackend::new(test_config()).unwrap();

        // when (操作):
        let result = backend.generate(&[Turn::new(Role::Human, "hi")], 128).await;

        // then (期待する結果):
        assert_eq!(result, Err(GenerateError::NotReady));
    }

    #[tokio::test]
    async fn test_initialize_without_api_key_fails() {
        // テスト項目: API キー未設定では initialize が Failed になる
        // given (前提条件):
        let config = OpenAiConfig {
            api_key: None,
            ..OpenAiConfig::default()
        };
        let backend = ChatCompletionBackend::new(config).unwrap();

        // when (操作):
        let state = backend.initialize().await;

        // then (期待する結果):
        assert_eq!(state, BackendState::Failed);
    }

    #[tokio::test]
    async fn test_initialize_with_api_key_reaches_ready() {
        // テスト項目: API キーがあれば initialize は Ready になり、冪等
        // given (前提条件):
        let backend = ChatCompletionBackend::new(test_config()).unwrap();

        // when (操作):
        let first = backend.initialize().await;
        let second = backend.initialize().await;

        // then (期待する結果):
        assert_eq!(first, BackendState::Ready);
        assert_eq!(second, BackendState::Ready);
    }

    #[tokio::test]
    async fn test_remote_failure_returns_fallback_text() {
        // テスト項目: リモート呼び出しの失敗は謝罪テキストに置き換えられる
        // given (前提条件): 接続できないエンドポイントを向ける
        let config = OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://127.0.0.1:1".to_string(),
            ..OpenAiConfig::default()
        };
        let backend = ChatCompletionBackend::new(config).unwrap();
        backend.initialize().await;

        // when (操作):
        let result = backend.generate(&[Turn::new(Role::Human, "hi")], 128).await;

        // then (期待する結果): エラーではなく固定テキストが返る
        assert_eq!(result, Ok(FALLBACK_TEXT.to_string()));
    }
}
