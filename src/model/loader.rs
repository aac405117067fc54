//! Checkpoint loading utilities.
//!
//! This module provides functions for:
//! - Downloading checkpoints from HuggingFace Hub
//! - Loading SafeTensors weights
//! - Parsing the HuggingFace `config.json` for GPT-2 style models

use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Paths to downloaded checkpoint files.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    /// Path to config.json.
    pub config: PathBuf,
    /// Paths to weight files (SafeTensors).
    pub weights: Vec<PathBuf>,
    /// Path to tokenizer.json.
    pub tokenizer: PathBuf,
}

/// Downloads checkpoint files from HuggingFace Hub.
///
/// # Arguments
///
/// * `model_id` - HuggingFace model ID (e.g., "openai-community/gpt2")
/// * `revision` - Git revision (branch, tag, or commit hash). Use "main" for latest.
///
/// # Returns
///
/// Paths to the downloaded files: config.json, model weights, tokenizer.json.
pub fn download_model(model_id: &str, revision: &str) -> Result<ModelFiles> {
    let api = Api::new().map_err(|e| Error::ModelLoad(format!("failed to create HF API: {e}")))?;

    let repo = api.repo(Repo::with_revision(
        model_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    let config_path = repo
        .get("config.json")
        .map_err(|e| Error::ModelLoad(format!("failed to download config.json: {e}")))?;

    let weights_paths = download_weights(&repo)?;

    let tokenizer_path = repo
        .get("tokenizer.json")
        .map_err(|e| Error::ModelLoad(format!("failed to download tokenizer.json: {e}")))?;

    Ok(ModelFiles {
        config: config_path,
        weights: weights_paths,
        tokenizer: tokenizer_path,
    })
}

/// Downloads model weight files, preferring a single SafeTensors file and
/// falling back to a sharded index.
fn download_weights(repo: &hf_hub::api::sync::ApiRepo) -> Result<Vec<PathBuf>> {
    if let Ok(path) = repo.get("model.safetensors") {
        return Ok(vec![path]);
    }

    if let Ok(index_path) = repo.get("model.safetensors.index.json") {
        let index_content = std::fs::read_to_string(&index_path)
            .map_err(|e| Error::ModelLoad(format!("failed to read safetensors index: {e}")))?;

        let index: serde_json::Value = serde_json::from_str(&index_content)
            .map_err(|e| Error::ModelLoad(format!("failed to parse safetensors index: {e}")))?;

        let weight_map = index["weight_map"].as_object().ok_or_else(|| {
            Error::ModelLoad("invalid safetensors index: missing weight_map".into())
        })?;

        let mut shard_files: Vec<String> = weight_map
            .values()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect();
        shard_files.sort();
        shard_files.dedup();

        let mut paths = Vec::new();
        for filename in shard_files {
            let path = repo
                .get(&filename)
                .map_err(|e| Error::ModelLoad(format!("failed to download {filename}: {e}")))?;
            paths.push(path);
        }
        return Ok(paths);
    }

    Err(Error::ModelLoad(
        "no SafeTensors weights found; this implementation only supports the SafeTensors format"
            .into(),
    ))
}

/// Creates a VarBuilder from SafeTensors files.
///
/// # Safety
///
/// Uses memory-mapped file access for efficient loading of model weights.
/// This is safe as long as the files are not modified while being read.
#[allow(unsafe_code)]
pub fn load_safetensors(
    paths: &[PathBuf],
    dtype: DType,
    device: &Device,
) -> Result<VarBuilder<'static>> {
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(paths, dtype, device)? };
    Ok(vb)
}

/// Loads a GPT-2 configuration from config.json.
pub fn load_config(path: &Path) -> Result<Gpt2Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::ModelLoad(format!("failed to read config.json: {e}")))?;

    let config: Gpt2Config = serde_json::from_str(&content)
        .map_err(|e| Error::ModelLoad(format!("failed to parse config.json: {e}")))?;

    Ok(config)
}

/// GPT-2 model configuration from a HuggingFace config.json.
#[derive(Debug, Clone, Deserialize)]
pub struct Gpt2Config {
    /// Vocabulary size.
    pub vocab_size: usize,
    /// Hidden (embedding) dimension.
    pub n_embd: usize,
    /// Number of transformer blocks.
    pub n_layer: usize,
    /// Number of attention heads.
    pub n_head: usize,
    /// Maximum sequence length (size of the learned position table).
    #[serde(default = "default_n_positions")]
    pub n_positions: usize,
    /// LayerNorm epsilon.
    #[serde(default = "default_layer_norm_epsilon")]
    pub layer_norm_epsilon: f64,
    /// End-of-sequence token ID.
    #[serde(default = "default_eos_token_id")]
    pub eos_token_id: u32,
}

fn default_n_positions() -> usize {
    1024
}

fn default_layer_norm_epsilon() -> f64 {
    1e-5
}

fn default_eos_token_id() -> u32 {
    50256
}

impl Gpt2Config {
    /// Dimension per attention head.
    pub fn head_dim(&self) -> usize {
        self.n_embd / self.n_head
    }

    /// A tiny configuration for unit tests and the random-init training path.
    pub fn tiny(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            n_embd: 16,
            n_layer: 2,
            n_head: 2,
            n_positions: 64,
            layer_norm_epsilon: 1e-5,
            eos_token_id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_apply() {
        let json = r#"{
            "vocab_size": 50257,
            "n_embd": 768,
            "n_layer": 12,
            "n_head": 12
        }"#;

        let config: Gpt2Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.n_positions, 1024);
        assert_eq!(config.layer_norm_epsilon, 1e-5);
        assert_eq!(config.eos_token_id, 50256);
        assert_eq!(config.head_dim(), 64);
    }

    #[test]
    fn config_explicit_values_win() {
        let json = r#"{
            "vocab_size": 100,
            "n_embd": 8,
            "n_layer": 1,
            "n_head": 2,
            "n_positions": 32,
            "layer_norm_epsilon": 1e-6,
            "eos_token_id": 3
        }"#;

        let config: Gpt2Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.n_positions, 32);
        assert_eq!(config.eos_token_id, 3);
        assert_eq!(config.head_dim(), 4);
    }
}
