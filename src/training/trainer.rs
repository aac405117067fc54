//! Minimal fine-tuning loop.
//!
//! AdamW over every model variable, next-token cross-entropy with the
//! usual shift-by-one alignment, a handful of steps, loss reported per
//! step.

use candle_core::{DType, Device};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarMap};
use tokenizers::Tokenizer;
use tracing::info;

use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use crate::model::{download_model, load_config, Gpt2LMHeadModel};

use super::batcher::TrainingBatch;

/// Loss recorded for one optimizer step.
#[derive(Debug, Clone, Copy)]
pub struct StepMetrics {
    /// Zero-based step index.
    pub step: usize,
    /// Cross-entropy loss for the step's batch.
    pub loss: f32,
}

/// Downloads a checkpoint and builds a trainable model.
///
/// The model is constructed over a fresh [`VarMap`] (so every weight is a
/// gradient-tracked variable) and the pretrained tensors are loaded on top
/// of the initialized values.
pub fn load_pretrained(
    model_id: &str,
    device: &Device,
) -> Result<(Gpt2LMHeadModel, VarMap, Tokenizer)> {
    let files = download_model(model_id, "main")?;
    let config = load_config(&files.config)?;

    let mut varmap = VarMap::new();
    let model = Gpt2LMHeadModel::random(&config, &varmap, device)?;

    if files.weights.len() != 1 {
        return Err(Error::ModelLoad(
            "sharded checkpoints are not supported for fine-tuning".into(),
        ));
    }
    varmap.load(&files.weights[0])?;

    let tokenizer =
        Tokenizer::from_file(&files.tokenizer).map_err(|e| Error::Tokenization(e.to_string()))?;

    Ok((model, varmap, tokenizer))
}

/// Runs the demo training loop.
pub struct Trainer {
    /// The model being fine-tuned.
    model: Gpt2LMHeadModel,
    /// AdamW over the model's variables.
    optimizer: AdamW,
    /// Loop configuration.
    config: TrainingConfig,
}

impl Trainer {
    /// Creates a trainer for a model whose variables live in `varmap`.
    pub fn new(model: Gpt2LMHeadModel, varmap: &VarMap, config: TrainingConfig) -> Result<Self> {
        let params = ParamsAdamW {
            lr: config.learning_rate,
            ..Default::default()
        };
        let optimizer = AdamW::new(varmap.all_vars(), params)?;

        Ok(Self {
            model,
            optimizer,
            config,
        })
    }

    /// Runs up to `num_steps` optimizer steps over the given batches.
    ///
    /// Returns the per-step metrics, one entry per executed step.
    pub fn train(&mut self, batches: &[TrainingBatch]) -> Result<Vec<StepMetrics>> {
        let mut metrics = Vec::with_capacity(self.config.num_steps);

        for (step, batch) in batches.iter().take(self.config.num_steps).enumerate() {
            let loss = self.step(batch)?;
            info!(step, loss, "training step");
            metrics.push(StepMetrics { step, loss });
        }

        Ok(metrics)
    }

    /// One forward/backward/update pass over a batch.
    fn step(&mut self, batch: &TrainingBatch) -> Result<f32> {
        let logits = self
            .model
            .forward_train(&batch.input_ids, Some(&batch.attention_mask))?;
        let (batch_size, seq_len, vocab_size) = logits.dims3()?;

        if seq_len < 2 {
            return Err(Error::Config(
                "sequences must hold at least two tokens to form a next-token target".into(),
            ));
        }

        // Position t predicts token t+1.
        let shift_logits = logits
            .narrow(1, 0, seq_len - 1)?
            .contiguous()?
            .reshape((batch_size * (seq_len - 1), vocab_size))?;
        let shift_labels = batch
            .labels
            .narrow(1, 1, seq_len - 1)?
            .contiguous()?
            .reshape((batch_size * (seq_len - 1),))?;

        let loss = candle_nn::loss::cross_entropy(&shift_logits, &shift_labels)?;
        self.optimizer.backward_step(&loss)?;

        Ok(loss.to_dtype(DType::F32)?.to_scalar::<f32>()?)
    }

    /// Returns the trainer's configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Consumes the trainer, returning the fine-tuned model.
    pub fn into_model(self) -> Gpt2LMHeadModel {
        self.model
    }
}
