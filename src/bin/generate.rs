//! CLI text generation demo: load a checkpoint, complete a prompt, print
//! the result.

use anyhow::Result;
use clap::Parser;

use tinygen::{auto_device, device_label, GenerationConfig, TextGenerator, DEFAULT_MODEL_ID};

#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(about = "Generate text from a pretrained checkpoint")]
struct Args {
    /// HuggingFace model ID
    #[arg(short, long, default_value = DEFAULT_MODEL_ID)]
    model: String,

    /// Input prompt
    #[arg(short, long, default_value = "The future of artificial intelligence is")]
    prompt: String,

    /// Maximum tokens to generate
    #[arg(long, default_value = "32")]
    max_tokens: usize,

    /// Sampling temperature (0 = greedy decoding)
    #[arg(long, default_value = "0.0")]
    temperature: f32,

    /// Top-p (nucleus) sampling mass
    #[arg(long, default_value = "1.0")]
    top_p: f32,

    /// RNG seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let device = auto_device()?;
    println!("Using device: {}", device_label(&device));
    println!("Loading model: {}", args.model);

    let mut generator = TextGenerator::load(&args.model, &device)?;

    let mut config = GenerationConfig::default()
        .max_new_tokens(args.max_tokens)
        .temperature(args.temperature)
        .top_p(args.top_p);
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }

    let output = generator.generate(&args.prompt, &config)?;
    println!("{}", output.text);

    Ok(())
}
