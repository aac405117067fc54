//! GPT-2 transformer block.
//!
//! Pre-norm residual block: normalization happens before each sub-layer
//! rather than after.
//!
//! ```text
//! Input
//!    ├──────────────┐ (residual)
//!    ▼              │
//!  ln_1             │
//!    ▼              │
//!  attention        │
//!    ▼              │
//!    + ◄────────────┘
//!    ├──────────────┐ (residual)
//!    ▼              │
//!  ln_2             │
//!    ▼              │
//!  mlp              │
//!    ▼              │
//!    + ◄────────────┘
//!    ▼
//! Output
//! ```

use candle_core::{Module, Result, Tensor};
use candle_nn::{layer_norm, LayerNorm, VarBuilder};

use super::attention::Attention;
use super::loader::Gpt2Config;
use super::mlp::Mlp;

/// A single GPT-2 transformer block.
#[derive(Debug, Clone)]
pub struct Block {
    /// Layer norm before attention.
    ln_1: LayerNorm,
    /// Causal self-attention.
    attn: Attention,
    /// Layer norm before the MLP.
    ln_2: LayerNorm,
    /// Feed-forward network.
    mlp: Mlp,
}

impl Block {
    /// Creates the block from a VarBuilder.
    pub fn new(config: &Gpt2Config, vb: VarBuilder) -> Result<Self> {
        let ln_1 = layer_norm(config.n_embd, config.layer_norm_epsilon, vb.pp("ln_1"))?;
        let attn = Attention::new(config, vb.pp("attn"))?;
        let ln_2 = layer_norm(config.n_embd, config.layer_norm_epsilon, vb.pp("ln_2"))?;
        let mlp = Mlp::new(config, vb.pp("mlp"))?;

        Ok(Self {
            ln_1,
            attn,
            ln_2,
            mlp,
        })
    }

    /// Drops the attention KV cache.
    pub fn clear_cache(&mut self) {
        self.attn.clear_cache();
    }

    /// Forward pass through the block.
    ///
    /// # Arguments
    ///
    /// * `hidden_states` - Input tensor [batch, seq_len, n_embd]
    /// * `use_cache` - Enable incremental-decoding KV cache
    /// * `attention_mask` - Optional additive attention mask
    ///
    /// # Returns
    ///
    /// Output tensor [batch, seq_len, n_embd]
    pub fn forward(
        &mut self,
        hidden_states: &Tensor,
        use_cache: bool,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let residual = hidden_states.clone();
        let hidden_states = self.ln_1.forward(hidden_states)?;
        let hidden_states = self.attn.forward(&hidden_states, use_cache, attention_mask)?;
        let hidden_states = (residual + hidden_states)?;

        let residual = hidden_states.clone();
        let hidden_states = self.ln_2.forward(&hidden_states)?;
        let hidden_states = self.mlp.forward(&hidden_states)?;
        residual + hidden_states
    }
}
