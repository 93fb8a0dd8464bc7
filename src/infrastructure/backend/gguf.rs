//! GGUF 量子化モデルを使った InferenceEngine 実装（feature `local-gguf`）
//!
//! candle で GGUF ファイルをロードし、温度・nucleus サンプリングで
//! 逐次トークン生成を行います。生成はプロンプト以降の新規トークンのみを
//! デコードして返します。

use async_trait::async_trait;
use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama::ModelWeights;
use tokenizers::Tokenizer;

use crate::config::LocalConfig;

use super::local::{EngineError, InferenceEngine};

/// サンプリングのシード（デプロイ内で固定）
const SAMPLING_SEED: u64 = 299792458;

/// モデルごとに異なる EOS トークンの候補
const EOS_CANDIDATES: &[&str] = &["<eos>", "</s>", "<|endoftext|>", "<end_of_turn>"];

/// GGUF モデルを使った推論エンジン
pub struct GgufEngine {
    config: LocalConfig,
    device: Device,
    model: Option<ModelWeights>,
    tokenizer: Option<Tokenizer>,
    eos_token: Option<u32>,
}

impl GgufEngine {
    /// 新しい GgufEngine を作成（モデルは未ロード）
    pub fn new(config: LocalConfig) -> Self {
        Self {
            config,
            device: Device::Cpu,
            model: None,
            tokenizer: None,
            eos_token: None,
        }
    }
}

#[async_trait]
impl InferenceEngine for GgufEngine {
    async fn load(&mut self) -> Result<(), EngineError> {
        let mut file = std::fs::File::open(&self.config.model_path).map_err(|e| {
            EngineError::Load(format!(
                "cannot open {}: {}",
                self.config.model_path.display(),
                e
            ))
        })?;
        let content = gguf_file::Content::read(&mut file)
            .map_err(|e| EngineError::Load(format!("invalid GGUF file: {e}")))?;
        let model = ModelWeights::from_gguf(content, &mut file, &self.device)
            .map_err(|e| EngineError::Load(format!("cannot build model weights: {e}")))?;

        let tokenizer = Tokenizer::from_file(&self.config.tokenizer_path).map_err(|e| {
            EngineError::Load(format!(
                "cannot load tokenizer {}: {}",
                self.config.tokenizer_path.display(),
                e
            ))
        })?;

        self.eos_token = EOS_CANDIDATES
            .iter()
            .find_map(|t| tokenizer.token_to_id(t));
        self.model = Some(model);
        self.tokenizer = Some(tokenizer);
        Ok(())
    }

    async fn complete(&mut self, prompt: &str, max_new_tokens: u32) -> Result<String, EngineError> {
        let model = self
            .model
            .as_mut()
            .ok_or_else(|| EngineError::Inference("model not loaded".to_string()))?;
        let tokenizer = self
            .tokenizer
            .as_ref()
            .ok_or_else(|| EngineError::Inference("tokenizer not loaded".to_string()))?;

        let encoding = tokenizer
            .encode(prompt, true)
            .map_err(|e| EngineError::Inference(format!("tokenization failed: {e}")))?;
        let prompt_tokens: Vec<u32> = encoding.get_ids().to_vec();
        let prompt_len = prompt_tokens.len();

        let mut logits_processor = LogitsProcessor::new(
            SAMPLING_SEED,
            Some(self.config.temperature),
            Some(self.config.top_p),
        );

        // プロンプト全体を 1 パスで処理し、以降は 1 トークンずつ生成する
        let input = Tensor::new(prompt_tokens.as_slice(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| EngineError::Inference(e.to_string()))?;
        let logits = model
            .forward(&input, 0)
            .and_then(|l| l.squeeze(0))
            .map_err(|e| EngineError::Inference(e.to_string()))?;
        let mut next_token = logits_processor
            .sample(&logits)
            .map_err(|e| EngineError::Inference(e.to_string()))?;

        let mut generated: Vec<u32> = Vec::with_capacity(max_new_tokens as usize);
        for index in 0..max_new_tokens as usize {
            if Some(next_token) == self.eos_token {
                break;
            }
            generated.push(next_token);
            if index + 1 == max_new_tokens as usize {
                break;
            }

            let input = Tensor::new(&[next_token], &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(|e| EngineError::Inference(e.to_string()))?;
            let logits = model
                .forward(&input, prompt_len + index)
                .and_then(|l| l.squeeze(0))
                .map_err(|e| EngineError::Inference(e.to_string()))?;
            next_token = logits_processor
                .sample(&logits)
                .map_err(|e| EngineError::Inference(e.to_string()))?;
        }

        // 新規に生成された継続のみをデコードする
        let text = tokenizer
            .decode(&generated, true)
            .map_err(|e| EngineError::Inference(format!("decoding failed: {e}")))?;
        Ok(text)
    }
}
