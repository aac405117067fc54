//! Fine-tuning demo: dataset, batching, and the training loop.

pub mod batcher;
pub mod dataset;
pub mod trainer;

pub use batcher::{BatchLoader, TrainingBatch};
pub use dataset::{QaDataset, QaExample, DEFAULT_DATASET_FILE, DEFAULT_DATASET_REPO};
pub use trainer::{load_pretrained, StepMetrics, Trainer};
