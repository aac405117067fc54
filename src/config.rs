//! Configuration types for tinygen.

use serde::{Deserialize, Serialize};

/// Default pretrained checkpoint used by every entry point.
///
/// The checkpoint must ship SafeTensors weights and a `tokenizer.json`;
/// see [`crate::model::download_model`].
pub const DEFAULT_MODEL_ID: &str = "openai-community/gpt2";

/// Sampling configuration for text generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of new tokens to generate.
    pub max_new_tokens: usize,
    /// Temperature for sampling (0.0 = greedy decoding).
    pub temperature: f32,
    /// Top-k sampling (0 = disabled).
    pub top_k: usize,
    /// Top-p (nucleus) sampling (1.0 = disabled).
    pub top_p: f32,
    /// RNG seed for reproducible sampling (None = entropy-seeded).
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 32,
            temperature: 0.0,
            top_k: 0,
            top_p: 1.0,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Set the maximum number of new tokens.
    pub fn max_new_tokens(mut self, max_new_tokens: usize) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the top-k sampling parameter.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the top-p (nucleus) sampling parameter.
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the RNG seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Configuration for the fine-tuning demo loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// AdamW learning rate.
    pub learning_rate: f64,
    /// Sequences per batch.
    pub batch_size: usize,
    /// Fixed sequence length; shorter inputs are padded, longer truncated.
    pub max_length: usize,
    /// Number of optimizer steps to run.
    pub num_steps: usize,
    /// How many dataset examples to keep (the demo trains on a small slice).
    pub max_examples: usize,
    /// RNG seed for batch shuffling.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 5e-5,
            batch_size: 4,
            max_length: 128,
            num_steps: 5,
            max_examples: 100,
            seed: 42,
        }
    }
}
