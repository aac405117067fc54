//! Fixed-length tokenization and batching.
//!
//! Mirrors the usual causal-LM preprocessing: every example is tokenized,
//! truncated and right-padded to the same length (padding with the EOS
//! token), labels are a copy of the input ids, and examples are shuffled
//! before being grouped into batches.

use candle_core::{Device, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection,
    TruncationParams, TruncationStrategy,
};

use crate::config::TrainingConfig;
use crate::error::{Error, Result};

use super::dataset::QaDataset;

/// One training batch of fixed-length sequences.
#[derive(Debug, Clone)]
pub struct TrainingBatch {
    /// Token IDs [batch, max_length].
    pub input_ids: Tensor,
    /// 1 for real tokens, 0 for padding [batch, max_length].
    pub attention_mask: Tensor,
    /// Training targets, a copy of the input IDs [batch, max_length].
    pub labels: Tensor,
}

/// Shuffled fixed-length batches over a QA dataset.
#[derive(Debug)]
pub struct BatchLoader {
    batches: Vec<TrainingBatch>,
}

impl BatchLoader {
    /// Tokenizes `dataset` and groups it into shuffled batches.
    ///
    /// The tokenizer is reconfigured for fixed-length padding and
    /// truncation; `pad_id` should be the EOS token for GPT-2 style
    /// tokenizers that ship without a pad token.
    pub fn prepare(
        tokenizer: &mut Tokenizer,
        dataset: &QaDataset,
        pad_id: u32,
        config: &TrainingConfig,
        device: &Device,
    ) -> Result<Self> {
        if dataset.is_empty() {
            return Err(Error::Dataset("cannot batch an empty dataset".into()));
        }

        let pad_token = tokenizer
            .id_to_token(pad_id)
            .unwrap_or_else(|| "<|endoftext|>".to_string());

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(config.max_length),
            direction: PaddingDirection::Right,
            pad_to_multiple_of: None,
            pad_id,
            pad_type_id: 0,
            pad_token,
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                direction: TruncationDirection::Right,
                max_length: config.max_length,
                strategy: TruncationStrategy::LongestFirst,
                stride: 0,
            }))
            .map_err(|e| Error::Tokenization(e.to_string()))?;

        let texts: Vec<String> = dataset.examples().iter().map(|ex| ex.render()).collect();
        let encodings = tokenizer
            .encode_batch(texts, false)
            .map_err(|e| Error::Tokenization(e.to_string()))?;

        let mut order: Vec<usize> = (0..encodings.len()).collect();
        let mut rng = StdRng::seed_from_u64(config.seed);
        order.shuffle(&mut rng);

        let mut batches = Vec::new();
        for chunk in order.chunks(config.batch_size) {
            let rows = chunk.len();
            let mut ids = Vec::with_capacity(rows * config.max_length);
            let mut mask = Vec::with_capacity(rows * config.max_length);
            for &idx in chunk {
                ids.extend_from_slice(encodings[idx].get_ids());
                mask.extend_from_slice(encodings[idx].get_attention_mask());
            }

            let input_ids = Tensor::from_vec(ids, (rows, config.max_length), device)?;
            let attention_mask = Tensor::from_vec(mask, (rows, config.max_length), device)?;
            let labels = input_ids.clone();

            batches.push(TrainingBatch {
                input_ids,
                attention_mask,
                labels,
            });
        }

        Ok(Self { batches })
    }

    /// Returns the batches in iteration order.
    pub fn batches(&self) -> &[TrainingBatch] {
        &self.batches
    }

    /// Number of batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// True when no batches were produced.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
