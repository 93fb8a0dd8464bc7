//! シングルターン API バックエンド（Gemini スタイル）
//!
//! ウィンドウの文脈順序を意図的に無視し、直近の人間ターンだけを後方
//! 走査で取り出して 1 ターンのリモート交換を行います。ターンをまたぐ
//! 状態を持たないのは仕様上の非対称であり、修正対象ではありません。
//! リモート失敗時はチャット補完バックエンドと同じ謝罪テキストを返します。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GeminiConfig;
use crate::domain::{BackendKind, BackendState, GenerateError, GenerationBackend, Role, Turn};

use super::{FALLBACK_TEXT, InitCell};

/// 人間ターンが 1 つも無い場合に送る既定の挨拶
const DEFAULT_GREETING: &str = "こんにちは";

/// リクエストタイムアウト
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

/// The most recent human turn's text, scanning the window backward.
/// Everything else in the window is discarded by design.
fn latest_human_text(window: &[Turn]) -> Option<&str> {
    window
        .iter()
        .rev()
        .find(|turn| turn.role == Role::Human)
        .map(|turn| turn.text.as_str())
}

/// シングルターン API バックエンド
pub struct SingleTurnBackend {
    config: GeminiConfig,
    client: reqwest::Client,
    init: InitCell,
}

impl SingleTurnBackend {
    /// 新しい SingleTurnBackend を作成（API キーの検証は initialize で行う）
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            config,
            client,
            init: InitCell::new(),
        })
    }

    async fn request_reply(&self, text: &str, max_new_tokens: u32) -> Result<String, String> {
        let api_key = self.config.api_key.as_deref().ok_or("API key missing")?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_new_tokens,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| e.to_string())?;
        let reply = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or("response contained no candidates")?;

        Ok(reply.trim().to_string())
    }
}

#[async_trait]
impl GenerationBackend for SingleTurnBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::SingleTurnApi
    }

    async fn state(&self) -> BackendState {
        self.init.state().await
    }

    async fn initialize(&self) -> BackendState {
        self.init
            .run_once(|| async {
                if self.config.api_key.is_none() {
                    return Err("GEMINI_API_KEY is required for the single-turn backend");
                }
                tracing::info!("Single-turn backend ready (model: {})", self.config.model);
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

        let text = latest_human_text(window).unwrap_or(DEFAULT_GREETING);

        // リモート失敗はここで握り潰し、固定の謝罪テキストに置き換える
        match self.request_reply(text, max_new_tokens).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                tracing::warn!("Single-turn API error: {}", e);
                Ok(FALLBACK_TEXT.to_string())
            }
        }
    }
}
