//! Text generation.
//!
//! [`TextGenerator`] owns a loaded model and its tokenizer and runs the
//! encode → prefill → decode-loop → decode flow:
//!
//! ```text
//! prompt ──► tokenize ──► prefill (full prompt, fills KV cache)
//!                              │
//!                              ▼
//!                   ┌── sample next token ◄──┐
//!                   │          │             │
//!                   │   EOS or budget?       │
//!                   │          │ no          │
//!                   │          ▼             │
//!                   │   forward(1 token) ────┘
//!                   ▼
//!            decode tokens ──► prompt + completion
//! ```

use candle_core::{DType, Device, Tensor};
use tokenizers::Tokenizer;

use crate::config::GenerationConfig;
use crate::device::device_label;
use crate::error::{Error, Result};
use crate::model::{download_model, load_config, load_safetensors, Gpt2LMHeadModel};

use super::sampler::Sampler;

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The model produced the end-of-sequence token.
    EndOfSequence,
    /// The new-token budget was exhausted.
    MaxTokens,
}

/// Output of a generation call.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Prompt followed by the decoded completion.
    pub text: String,
    /// The decoded completion alone.
    pub completion: String,
    /// Number of tokens generated.
    pub tokens_generated: usize,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
}

/// A loaded model plus tokenizer, ready to generate text.
pub struct TextGenerator {
    /// The language model.
    model: Gpt2LMHeadModel,
    /// Tokenizer for encoding/decoding text.
    tokenizer: Tokenizer,
    /// Device the model lives on.
    device: Device,
    /// End-of-sequence token ID.
    eos_token_id: u32,
}

impl TextGenerator {
    /// Downloads a checkpoint and builds a generator on the given device.
    pub fn load(model_id: &str, device: &Device) -> Result<Self> {
        tracing::info!(model_id, device = device_label(device), "loading model");

        let files = download_model(model_id, "main")?;
        let config = load_config(&files.config)?;
        let vb = load_safetensors(&files.weights, DType::F32, device)?;
        let model = Gpt2LMHeadModel::new(&config, vb)?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| Error::Tokenization(e.to_string()))?;

        Ok(Self::from_parts(model, tokenizer, device.clone()))
    }

    /// Builds a generator from already-constructed parts.
    pub fn from_parts(model: Gpt2LMHeadModel, tokenizer: Tokenizer, device: Device) -> Self {
        let eos_token_id = tokenizer
            .token_to_id("<|endoftext|>")
            .unwrap_or(model.config().eos_token_id);

        Self {
            model,
            tokenizer,
            device,
            eos_token_id,
        }
    }

    /// Generates a completion for `prompt`.
    ///
    /// The returned [`GenerationOutput::text`] always starts with the
    /// prompt itself.
    pub fn generate(
        &mut self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationOutput> {
        let encoding = self
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| Error::Tokenization(e.to_string()))?;
        let prompt_tokens: Vec<u32> = encoding.get_ids().to_vec();

        if prompt_tokens.is_empty() {
            return Err(Error::Tokenization("empty prompt".into()));
        }

        let mut sampler = Sampler::new(config);
        self.model.clear_cache();

        let input = Tensor::new(prompt_tokens.as_slice(), &self.device)?.unsqueeze(0)?;
        let mut logits = self.model.forward(&input, 0)?;

        let mut generated: Vec<u32> = Vec::with_capacity(config.max_new_tokens);
        let mut finish_reason = FinishReason::MaxTokens;
        let mut pos = prompt_tokens.len();

        while generated.len() < config.max_new_tokens {
            let next_token = sampler.sample(&logits)?;

            if next_token == self.eos_token_id {
                finish_reason = FinishReason::EndOfSequence;
                break;
            }
            generated.push(next_token);

            if generated.len() == config.max_new_tokens {
                break;
            }

            let input = Tensor::new(&[next_token], &self.device)?.unsqueeze(0)?;
            logits = self.model.forward(&input, pos)?;
            pos += 1;
        }

        // The cache belongs to this sequence only.
        self.model.clear_cache();

        let completion = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| Error::Tokenization(e.to_string()))?;

        Ok(GenerationOutput {
            text: format!("{prompt}{completion}"),
            completion,
            tokens_generated: generated.len(),
            finish_reason,
        })
    }

    /// Returns the end-of-sequence token ID.
    pub fn eos_token_id(&self) -> u32 {
        self.eos_token_id
    }

    /// Returns a reference to the tokenizer.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Returns the device the model runs on.
    pub fn device(&self) -> &Device {
        &self.device
    }
}
