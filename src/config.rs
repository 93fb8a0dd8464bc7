//! Process configuration.
//!
//! Backend selection and per-variant parameters are read from the
//! environment exactly once at startup, before any connection is served.
//! The selected variant never changes at runtime.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::BackendKind;

/// Number of most-recent session turns sent as generation context.
pub const HISTORY_WINDOW: usize = 6;

/// Upper bound on newly generated tokens per reply.
pub const MAX_NEW_TOKENS: u32 = 128;

/// Sampling temperature, fixed per deployment.
pub const TEMPERATURE: f64 = 0.7;

/// Nucleus-sampling parameter, fixed per deployment.
pub const TOP_P: f64 = 0.9;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// `MODEL_TYPE` was set to something other than `local`, `openai`, or
    /// `gemini`.
    #[error("invalid MODEL_TYPE: {0} (use 'local', 'openai' or 'gemini')")]
    InvalidModelType(String),
}

/// Local inference settings.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Path to the GGUF model file (`LOCAL_MODEL_PATH`).
    pub model_path: PathBuf,
    /// Path to the tokenizer definition (`LOCAL_TOKENIZER_PATH`).
    pub tokenizer_path: PathBuf,
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/model.gguf"),
            tokenizer_path: PathBuf::from("models/tokenizer.json"),
            temperature: TEMPERATURE,
            top_p: TOP_P,
        }
    }
}

/// Chat completion API settings (OpenAI-style).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key (`OPENAI_API_KEY`). Missing key fails initialization.
    pub api_key: Option<String>,
    /// Model identifier (`OPENAI_MODEL`, default: "gpt-3.5-turbo").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com".to_string(),
            temperature: TEMPERATURE,
            top_p: TOP_P,
        }
    }
}

/// Single-turn API settings (Gemini-style).
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key (`GEMINI_API_KEY`). Missing key fails initialization.
    pub api_key: Option<String>,
    /// Model identifier (`GEMINI_MODEL`, default: "gemini-pro").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

/// Top-level backend configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Which backend variant to serve with.
    pub kind: BackendKind,
    pub local: LocalConfig,
    pub openai: OpenAiConfig,
    pub gemini: GeminiConfig,
    pub max_new_tokens: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Local,
            local: LocalConfig::default(),
            openai: OpenAiConfig::default(),
            gemini: GeminiConfig::default(),
            max_new_tokens: MAX_NEW_TOKENS,
        }
    }
}

impl BackendConfig {
    /// Read the configuration from environment variables.
    ///
    /// `MODEL_TYPE` selects the variant (default: "local"); the remaining
    /// variables fill in per-variant parameters.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidModelType`] for an unknown `MODEL_TYPE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let model_type = std::env::var("MODEL_TYPE")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase();
        let kind = parse_model_type(&model_type)?;

        let mut config = Self {
            kind,
            ..Self::default()
        };

        if let Ok(path) = std::env::var("LOCAL_MODEL_PATH") {
            config.local.model_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("LOCAL_TOKENIZER_PATH") {
            config.local.tokenizer_path = PathBuf::from(path);
        }
        config.openai.api_key = std::env::var("OPENAI_API_KEY").ok();
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.openai.model = model;
        }
        config.gemini.api_key = std::env::var("GEMINI_API_KEY").ok();
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.gemini.model = model;
        }

        Ok(config)
    }
}

fn parse_model_type(s: &str) -> Result<BackendKind, ConfigError> {
    match s {
        "local" => Ok(BackendKind::Local),
        "openai" => Ok(BackendKind::ChatCompletionApi),
        "gemini" => Ok(BackendKind::SingleTurnApi),
        other => Err(ConfigError::InvalidModelType(other.to_string())),
    }
}
