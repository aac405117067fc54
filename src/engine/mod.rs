//! Text generation engine: sampling and the generate loop.

pub mod generator;
pub mod sampler;

pub use generator::{FinishReason, GenerationOutput, TextGenerator};
pub use sampler::Sampler;
