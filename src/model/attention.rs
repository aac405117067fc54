//! GPT-2 causal self-attention.
//!
//! Multi-head attention with a fused QKV projection and an internal KV
//! cache for incremental decoding. Unlike newer architectures there is no
//! grouped-query sharing and no rotary embedding; positions come from the
//! learned position table in the embedding layer.

use candle_core::{Device, Result, Tensor, D};
use candle_nn::VarBuilder;

use super::conv1d::Conv1D;
use super::loader::Gpt2Config;

/// Multi-head causal self-attention.
#[derive(Debug, Clone)]
pub struct Attention {
    /// Fused QKV projection [n_embd] -> [3 * n_embd].
    c_attn: Conv1D,
    /// Output projection [n_embd] -> [n_embd].
    c_proj: Conv1D,
    /// Number of attention heads.
    num_heads: usize,
    /// Dimension per head.
    head_dim: usize,
    /// Scaling factor for attention scores.
    scale: f64,
    /// Cached (key, value) tensors [batch, heads, kv_len, head_dim].
    kv_cache: Option<(Tensor, Tensor)>,
}

impl Attention {
    /// Creates the attention layer from a VarBuilder.
    pub fn new(config: &Gpt2Config, vb: VarBuilder) -> Result<Self> {
        let n_embd = config.n_embd;
        let c_attn = Conv1D::load(n_embd, 3 * n_embd, vb.pp("c_attn"))?;
        let c_proj = Conv1D::load(n_embd, n_embd, vb.pp("c_proj"))?;

        let head_dim = config.head_dim();
        let scale = 1.0 / (head_dim as f64).sqrt();

        Ok(Self {
            c_attn,
            c_proj,
            num_heads: config.n_head,
            head_dim,
            scale,
            kv_cache: None,
        })
    }

    /// Drops the KV cache. Must be called between independent sequences.
    pub fn clear_cache(&mut self) {
        self.kv_cache = None;
    }

    /// Forward pass through the attention layer.
    ///
    /// # Arguments
    ///
    /// * `hidden_states` - Input tensor [batch, seq_len, n_embd]
    /// * `use_cache` - Append K/V to the cache and attend over it
    ///   (incremental decoding). Training passes `false`.
    /// * `attention_mask` - Optional additive mask broadcastable to
    ///   [batch, heads, seq_len, kv_len]
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
        let (batch_size, seq_len, _) = hidden_states.dims3()?;
        let n_embd = self.num_heads * self.head_dim;

        // Fused projection, then split into Q, K, V
        let qkv = self.c_attn.forward(hidden_states)?;
        let q = qkv.narrow(D::Minus1, 0, n_embd)?;
        let k = qkv.narrow(D::Minus1, n_embd, n_embd)?;
        let v = qkv.narrow(D::Minus1, 2 * n_embd, n_embd)?;

        // [batch, seq_len, n_embd] -> [batch, heads, seq_len, head_dim]
        let q = self.split_heads(&q, batch_size, seq_len)?;
        let mut k = self.split_heads(&k, batch_size, seq_len)?;
        let mut v = self.split_heads(&v, batch_size, seq_len)?;

        if use_cache {
            if let Some((k_cache, v_cache)) = &self.kv_cache {
                k = Tensor::cat(&[k_cache, &k], 2)?;
                v = Tensor::cat(&[v_cache, &v], 2)?;
            }
            self.kv_cache = Some((k.clone(), v.clone()));
        }

        let kv_len = k.dim(2)?;

        // Scores: Q @ K^T / sqrt(d)  -> [batch, heads, seq_len, kv_len]
        let attn_weights = (q.matmul(&k.transpose(D::Minus2, D::Minus1)?.contiguous()?)?
            * self.scale)?;

        // A single query position attends to the whole cache, so the causal
        // mask only matters when scoring more than one position at once.
        let attn_weights = if seq_len > 1 {
            let mask = causal_mask(seq_len, kv_len, attn_weights.dtype(), q.device())?;
            attn_weights.broadcast_add(&mask)?
        } else {
            attn_weights
        };

        let attn_weights = match attention_mask {
            Some(mask) => attn_weights.broadcast_add(mask)?,
            None => attn_weights,
        };

        let attn_weights = candle_nn::ops::softmax_last_dim(&attn_weights)?;

        // [batch, heads, seq_len, head_dim] -> [batch, seq_len, n_embd]
        let attn_output = attn_weights.matmul(&v.contiguous()?)?;
        let attn_output = attn_output
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch_size, seq_len, n_embd))?;

        self.c_proj.forward(&attn_output)
    }

    /// [batch, seq_len, n_embd] -> [batch, heads, seq_len, head_dim]
    fn split_heads(&self, x: &Tensor, batch_size: usize, seq_len: usize) -> Result<Tensor> {
        x.reshape((batch_size, seq_len, self.num_heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()
    }
}

/// Builds the additive causal mask [1, 1, seq_len, kv_len].
///
/// Query position `i` (offset by any cached prefix) may attend to key
/// positions `0..=i + kv_len - seq_len`.
fn causal_mask(
    seq_len: usize,
    kv_len: usize,
    dtype: candle_core::DType,
    device: &Device,
) -> Result<Tensor> {
    let offset = kv_len - seq_len;
    let mask: Vec<f32> = (0..seq_len)
        .flat_map(|i| {
            (0..kv_len).map(move |j| if j <= i + offset { 0.0 } else { f32::NEG_INFINITY })
        })
        .collect();
    Tensor::from_vec(mask, (1, 1, seq_len, kv_len), device)?.to_dtype(dtype)
}
