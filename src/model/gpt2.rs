//! GPT-2 model implementation.
//!
//! Token embeddings plus a learned position table, a stack of pre-norm
//! transformer blocks, a final LayerNorm, and a language-model head tied
//! to the token embedding weights.
//!
//! ```text
//! Input Token IDs
//!       │
//!       ▼
//! ┌───────────────┐
//! │  wte + wpe    │  token + position embeddings
//! └───────────────┘
//!       │
//!       ▼
//! ┌───────────────┐
//! │    Block      │ × n_layer
//! └───────────────┘
//!       │
//!       ▼
//! ┌───────────────┐
//! │    ln_f       │  final normalization
//! └───────────────┘
//!       │
//!       ▼
//! ┌───────────────┐
//! │  wte^T head   │  tied projection to vocab
//! └───────────────┘
//!       │
//!       ▼
//! Output Logits
//! ```

use candle_core::{bail, DType, Device, Module, Result, Tensor};
use candle_nn::{embedding, layer_norm, Embedding, LayerNorm, VarBuilder, VarMap};

use super::block::Block;
use super::loader::Gpt2Config;

/// GPT-2 transformer without the LM head.
#[derive(Debug, Clone)]
pub struct Gpt2Model {
    /// Token embeddings [vocab_size, n_embd].
    wte: Embedding,
    /// Learned position embeddings [n_positions, n_embd].
    wpe: Embedding,
    /// Transformer blocks.
    blocks: Vec<Block>,
    /// Final layer normalization.
    ln_f: LayerNorm,
    /// Size of the learned position table.
    n_positions: usize,
    /// Device.
    device: Device,
    /// Data type.
    dtype: DType,
}

impl Gpt2Model {
    /// Creates a Gpt2Model from a VarBuilder.
    pub fn new(config: &Gpt2Config, vb: VarBuilder) -> Result<Self> {
        let wte = embedding(config.vocab_size, config.n_embd, vb.pp("wte"))?;
        let wpe = embedding(config.n_positions, config.n_embd, vb.pp("wpe"))?;

        let mut blocks = Vec::with_capacity(config.n_layer);
        for i in 0..config.n_layer {
            blocks.push(Block::new(config, vb.pp(format!("h.{i}")))?);
        }

        let ln_f = layer_norm(config.n_embd, config.layer_norm_epsilon, vb.pp("ln_f"))?;

        Ok(Self {
            wte,
            wpe,
            blocks,
            ln_f,
            n_positions: config.n_positions,
            device: vb.device().clone(),
            dtype: vb.dtype(),
        })
    }

    /// Forward pass through the transformer (without LM head).
    ///
    /// # Arguments
    ///
    /// * `input_ids` - Token IDs [batch, seq_len]
    /// * `start_pos` - Position of the first input token (the cached prefix
    ///   length during incremental decoding, 0 otherwise)
    /// * `use_cache` - Enable the per-block KV cache
    /// * `attention_mask` - Optional additive attention mask
    ///
    /// # Returns
    ///
    /// Hidden states [batch, seq_len, n_embd]
    pub fn forward(
        &mut self,
        input_ids: &Tensor,
        start_pos: usize,
        use_cache: bool,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let (_batch_size, seq_len) = input_ids.dims2()?;

        if start_pos + seq_len > self.n_positions {
            bail!(
                "sequence of length {} exceeds the position table ({} entries)",
                start_pos + seq_len,
                self.n_positions
            );
        }

        let token_embeds = self.wte.forward(input_ids)?;

        let positions =
            Tensor::arange(start_pos as u32, (start_pos + seq_len) as u32, &self.device)?;
        let position_embeds = self.wpe.forward(&positions)?; // [seq_len, n_embd]

        let mut hidden_states = token_embeds.broadcast_add(&position_embeds)?;

        for block in &mut self.blocks {
            hidden_states = block.forward(&hidden_states, use_cache, attention_mask)?;
        }

        self.ln_f.forward(&hidden_states)
    }

    /// Drops every block's KV cache.
    pub fn clear_cache(&mut self) {
        for block in &mut self.blocks {
            block.clear_cache();
        }
    }

    /// Returns the token embedding layer (for weight tying).
    pub fn wte(&self) -> &Embedding {
        &self.wte
    }

    /// Returns the device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Returns the data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }
}

/// GPT-2 with the tied language-model head.
#[derive(Debug, Clone)]
pub struct Gpt2LMHeadModel {
    /// Base transformer.
    model: Gpt2Model,
    /// Model configuration.
    config: Gpt2Config,
}

impl Gpt2LMHeadModel {
    /// Creates a Gpt2LMHeadModel from a VarBuilder.
    pub fn new(config: &Gpt2Config, vb: VarBuilder) -> Result<Self> {
        let model = Gpt2Model::new(config, vb)?;
        Ok(Self {
            model,
            config: config.clone(),
        })
    }

    /// Creates a model with freshly initialized weights backed by `varmap`.
    ///
    /// Used by the training path (pretrained weights are loaded over the
    /// variables afterwards) and by tests that need a tiny random model.
    pub fn random(config: &Gpt2Config, varmap: &VarMap, device: &Device) -> Result<Self> {
        let vb = VarBuilder::from_varmap(varmap, DType::F32, device);
        Self::new(config, vb)
    }

    /// Incremental-decoding forward pass.
    ///
    /// Appends to the KV cache and returns logits for the last position
    /// only.
    ///
    /// # Arguments
    ///
    /// * `input_ids` - Token IDs [batch, seq_len]
    /// * `start_pos` - Length of the cached prefix
    ///
    /// # Returns
    ///
    /// Logits [batch, vocab_size]
    pub fn forward(&mut self, input_ids: &Tensor, start_pos: usize) -> Result<Tensor> {
        let hidden_states = self.model.forward(input_ids, start_pos, true, None)?;

        let seq_len = hidden_states.dim(1)?;
        let last_hidden = hidden_states.narrow(1, seq_len - 1, 1)?.squeeze(1)?;

        self.project(&last_hidden)
    }

    /// Training forward pass: no cache, logits for every position.
    ///
    /// # Arguments
    ///
    /// * `input_ids` - Token IDs [batch, seq_len]
    /// * `attention_mask` - Optional padding mask [batch, seq_len] with 1
    ///   for real tokens and 0 for padding
    ///
    /// # Returns
    ///
    /// Logits [batch, seq_len, vocab_size]
    pub fn forward_train(
        &mut self,
        input_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let additive_mask = match attention_mask {
            Some(mask) => Some(padding_mask(mask)?),
            None => None,
        };

        let hidden_states =
            self.model
                .forward(input_ids, 0, false, additive_mask.as_ref())?;

        self.project(&hidden_states)
    }

    /// Projects hidden states to vocabulary logits through the tied
    /// embedding weights.
    fn project(&self, hidden_states: &Tensor) -> Result<Tensor> {
        let embed_weight = self.model.wte().embeddings(); // [vocab, n_embd]
        hidden_states.broadcast_matmul(&embed_weight.t()?)
    }

    /// Drops the KV cache. Must be called between independent sequences.
    pub fn clear_cache(&mut self) {
        self.model.clear_cache();
    }

    /// Returns the model configuration.
    pub fn config(&self) -> &Gpt2Config {
        &self.config
    }

    /// Returns the device.
    pub fn device(&self) -> &Device {
        self.model.device()
    }

    /// Returns the data type.
    pub fn dtype(&self) -> DType {
        self.model.dtype()
    }
}

/// Converts a 0/1 padding mask [batch, seq_len] into an additive attention
/// mask [batch, 1, 1, seq_len].
///
/// Padded keys get a large negative score rather than -inf so that rows
/// consisting entirely of padding still produce finite softmax output.
fn padding_mask(attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask.to_dtype(DType::F32)?;
    // 1 -> 0, 0 -> -1e9
    let mask = mask.affine(1e9, -1e9)?;
    mask.unsqueeze(1)?.unsqueeze(1)
}
