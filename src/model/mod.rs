//! GPT-2 model components.
//!
//! - [`loader`]: checkpoint download and config parsing
//! - [`conv1d`]: input-major linear projection (checkpoint layout)
//! - [`attention`]: causal self-attention with KV cache
//! - [`mlp`]: GELU feed-forward
//! - [`block`]: pre-norm transformer block
//! - [`gpt2`]: the full model and LM head

pub mod attention;
pub mod block;
pub mod conv1d;
pub mod gpt2;
pub mod loader;
pub mod mlp;

pub use gpt2::{Gpt2LMHeadModel, Gpt2Model};
pub use loader::{download_model, load_config, load_safetensors, Gpt2Config, ModelFiles};
