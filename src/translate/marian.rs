//! Marian translation model loaded from the Hugging Face hub via candle.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::marian::{self, MTModel};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::Tokenizer;

use super::{chunk_text, Language, TranslateError, MAX_CHUNK_CHARS};

const MODEL_REVISION: &str = "main";

/// Decode-step cap per chunk
const MAX_DECODE_STEPS: usize = 512;

/// Fixed sampling seed; with no temperature set the processor is greedy
const SEED: u64 = 299792458;

/// English-to-target Marian model wrapper
///
/// Downloads `Helsinki-NLP/opus-mt-en-<code>` on first use (cached by the
/// hub client afterwards) and runs greedy decoding on CPU.
pub struct MarianTranslator {
    model: MTModel,
    tokenizer: Tokenizer,
    config: marian::Config,
    device: Device,
}

impl MarianTranslator {
    /// Fetch and load the model for the target language
    pub fn load(target: Language) -> Result<Self, TranslateError> {
        let model_id = format!("Helsinki-NLP/opus-mt-en-{}", target.code());
        tracing::info!(model = %model_id, "loading translation model");

        let device = Device::Cpu;

        let api = Api::new().map_err(|e| TranslateError::Model(format!("hub API: {}", e)))?;
        let repo = api.repo(Repo::with_revision(
            model_id.clone(),
            RepoType::Model,
            MODEL_REVISION.to_string(),
        ));

        let config_path = repo
            .get("config.json")
            .map_err(|e| TranslateError::Model(format!("failed to download config: {}", e)))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| TranslateError::Model(format!("failed to download tokenizer: {}", e)))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| TranslateError::Model(format!("failed to download weights: {}", e)))?;

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| TranslateError::Model(format!("failed to read config: {}", e)))?;
        let config: marian::Config = serde_json::from_str(&config_str)
            .map_err(|e| TranslateError::Model(format!("failed to parse config: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| TranslateError::Model(format!("failed to load tokenizer: {}", e)))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(|e| TranslateError::Model(format!("failed to load weights: {}", e)))?
        };

        let model = MTModel::new(&config, vb)
            .map_err(|e| TranslateError::Model(format!("failed to build model: {}", e)))?;

        tracing::info!(model = %model_id, "translation model loaded");

        Ok(Self {
            model,
            tokenizer,
            config,
            device,
        })
    }

    /// Translate text, chunking long inputs; chunk outputs are joined
    /// with newlines
    pub fn translate(&mut self, text: &str) -> Result<String, TranslateError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        let mut translated = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            if chunk.trim().is_empty() {
                continue;
            }
            translated.push(self.translate_chunk(chunk)?);
        }

        Ok(translated.join("\n"))
    }

    fn translate_chunk(&mut self, chunk: &str) -> Result<String, TranslateError> {
        self.model.reset_kv_cache();

        let mut tokens = self
            .tokenizer
            .encode(chunk, true)
            .map_err(|e| TranslateError::Model(format!("tokenization failed: {}", e)))?
            .get_ids()
            .to_vec();
        if tokens.last() != Some(&self.config.eos_token_id) {
            tokens.push(self.config.eos_token_id);
        }

        let encoder_input = Tensor::new(tokens.as_slice(), &self.device)?.unsqueeze(0)?;
        let encoder_xs = self.model.encoder().forward(&encoder_input, 0)?;

        let mut logits_processor = LogitsProcessor::new(SEED, None, None);
        let mut token_ids = vec![self.config.decoder_start_token_id];

        for index in 0..MAX_DECODE_STEPS {
            // After the first step only the newest token is fed; the
            // decoder keeps earlier state in its KV cache.
            let context_size = if index >= 1 { 1 } else { token_ids.len() };
            let start_pos = token_ids.len().saturating_sub(context_size);
            let input_ids = Tensor::new(&token_ids[start_pos..], &self.device)?.unsqueeze(0)?;

            let logits = self.model.decode(&input_ids, &encoder_xs, start_pos)?;
            let logits = logits.squeeze(0)?;
            let logits = logits.get(logits.dim(0)? - 1)?;

            let token = logits_processor
                .sample(&logits)
                .map_err(|e| TranslateError::Model(format!("sampling failed: {}", e)))?;
            if token == self.config.eos_token_id || token == self.config.forced_eos_token_id {
                break;
            }
            token_ids.push(token);
        }

        let output_ids: Vec<u32> = token_ids.into_iter().skip(1).collect();
        self.tokenizer
            .decode(&output_ids, true)
            .map_err(|e| TranslateError::Model(format!("detokenization failed: {}", e)))
    }
}
