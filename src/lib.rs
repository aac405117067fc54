//! tinygen: a small pretrained-LM playground in Rust.
//!
//! Three entry points over one library:
//! - `generate`: load a checkpoint and print a completion for a prompt
//! - `serve`: the same flow behind a local web page with sampling sliders
//! - `train`: a minimal fine-tuning loop over a QA dataset slice

pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod model;
pub mod server;
pub mod training;

pub use config::{GenerationConfig, TrainingConfig, DEFAULT_MODEL_ID};
pub use device::{auto_device, device_label};
pub use engine::{FinishReason, GenerationOutput, Sampler, TextGenerator};
pub use error::{Error, Result};
pub use model::{
    download_model, load_config, load_safetensors, Gpt2Config, Gpt2LMHeadModel, ModelFiles,
};
pub use training::{BatchLoader, QaDataset, StepMetrics, Trainer, TrainingBatch};
