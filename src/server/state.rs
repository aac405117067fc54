//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::engine::TextGenerator;

/// State shared across request handlers.
///
/// A single model instance serves every request; generation mutates the
/// KV cache and the sampler RNG, so inference is serialized behind the
/// mutex.
#[derive(Clone)]
pub struct AppState {
    /// The loaded generator.
    pub generator: Arc<Mutex<TextGenerator>>,
    /// Checkpoint the generator was loaded from, for display.
    pub model_id: String,
}

impl AppState {
    /// Wraps a loaded generator for sharing.
    pub fn new(generator: TextGenerator, model_id: impl Into<String>) -> Self {
        Self {
            generator: Arc::new(Mutex::new(generator)),
            model_id: model_id.into(),
        }
    }
}
