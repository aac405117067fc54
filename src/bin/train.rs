//! Fine-tuning demo: a few AdamW steps over a slice of a QA dataset.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tinygen::training::{
    load_pretrained, BatchLoader, QaDataset, Trainer, DEFAULT_DATASET_FILE, DEFAULT_DATASET_REPO,
};
use tinygen::{auto_device, device_label, TrainingConfig, DEFAULT_MODEL_ID};

#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(about = "Run a short fine-tuning loop on a QA dataset slice")]
struct Args {
    /// HuggingFace model ID
    #[arg(short, long, default_value = DEFAULT_MODEL_ID)]
    model: String,

    /// HuggingFace dataset repo to pull from
    #[arg(long, default_value = DEFAULT_DATASET_REPO)]
    dataset: String,

    /// File inside the dataset repo
    #[arg(long, default_value = DEFAULT_DATASET_FILE)]
    dataset_file: String,

    /// Local SQuAD-format JSON file, used instead of downloading
    #[arg(long)]
    dataset_path: Option<PathBuf>,

    /// Number of optimizer steps
    #[arg(long, default_value = "5")]
    steps: usize,

    /// Sequences per batch
    #[arg(long, default_value = "4")]
    batch_size: usize,

    /// Fixed tokenized sequence length
    #[arg(long, default_value = "128")]
    max_length: usize,

    /// AdamW learning rate
    #[arg(long, default_value = "5e-5")]
    learning_rate: f64,

    /// How many dataset examples to keep
    #[arg(long, default_value = "100")]
    max_examples: usize,

    /// Shuffling seed
    #[arg(long, default_value = "42")]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tinygen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let device = auto_device()?;
    println!("Using device: {}", device_label(&device));
    println!("Loading model: {}", args.model);

    let (model, varmap, mut tokenizer) = load_pretrained(&args.model, &device)?;
    let pad_id = model.config().eos_token_id;

    println!("Loading dataset...");
    let dataset = match &args.dataset_path {
        Some(path) => QaDataset::from_file(path)?,
        None => QaDataset::download(&args.dataset, &args.dataset_file)?,
    }
    .take(args.max_examples);

    let config = TrainingConfig {
        learning_rate: args.learning_rate,
        batch_size: args.batch_size,
        max_length: args.max_length,
        num_steps: args.steps,
        max_examples: args.max_examples,
        seed: args.seed,
    };

    let loader = BatchLoader::prepare(&mut tokenizer, &dataset, pad_id, &config, &device)?;
    info!(
        examples = dataset.len(),
        batches = loader.len(),
        "dataset tokenized"
    );

    println!("Starting training (demo: {} steps)...", config.num_steps);
    let mut trainer = Trainer::new(model, &varmap, config)?;
    let metrics = trainer.train(loader.batches())?;

    for m in &metrics {
        println!("Step {}: Loss = {:.4}", m.step, m.loss);
    }
    println!("Training demo completed!");

    Ok(())
}
