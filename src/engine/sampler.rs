//! Next-token sampling.
//!
//! Selects the next token from the model's logits:
//!
//! - **Greedy** (temperature 0): argmax, fully deterministic
//! - **Temperature**: rescales logits before the softmax
//! - **Top-k**: keeps only the k most likely tokens
//! - **Top-p (nucleus)**: keeps tokens covering p probability mass
//!
//! Filters compose in that order; the surviving distribution is
//! renormalized before the draw.

use candle_core::{DType, Tensor};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};

/// Token sampler with configurable filtering.
#[derive(Debug)]
pub struct Sampler {
    /// Temperature for scaling logits (0.0 = greedy).
    temperature: f32,
    /// Top-k value (0 = disabled).
    top_k: usize,
    /// Top-p value (1.0 = disabled).
    top_p: f32,
    /// Random number generator.
    rng: StdRng,
}

impl Sampler {
    /// Creates a sampler from a generation config, honoring its seed.
    pub fn new(config: &GenerationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            rng,
        }
    }

    /// Samples the next token from 1D logits (or [1, vocab_size]).
    pub fn sample(&mut self, logits: &Tensor) -> Result<u32> {
        let logits: Vec<f32> = logits.to_dtype(DType::F32)?.flatten_all()?.to_vec1()?;
        if logits.is_empty() {
            return Err(Error::Config("cannot sample from empty logits".into()));
        }

        if self.temperature <= 0.0 {
            return Ok(argmax(&logits));
        }

        // Stable softmax over temperature-scaled logits.
        let inv_temp = 1.0 / self.temperature;
        let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let probs: Vec<f32> = logits
            .iter()
            .map(|&l| ((l - max_logit) * inv_temp).exp())
            .collect();

        let mut candidates: Vec<(u32, f32)> = probs
            .iter()
            .enumerate()
            .map(|(id, &p)| (id as u32, p))
            .collect();
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        if self.top_k > 0 && self.top_k < candidates.len() {
            candidates.truncate(self.top_k);
        }

        if self.top_p > 0.0 && self.top_p < 1.0 {
            let total: f32 = candidates.iter().map(|(_, p)| p).sum();
            let threshold = self.top_p * total;
            let mut cumulative = 0.0f32;
            let mut cutoff = candidates.len();
            for (i, (_, p)) in candidates.iter().enumerate() {
                cumulative += p;
                if cumulative > threshold {
                    // Keep the token that pushed us over the mass budget.
                    cutoff = i + 1;
                    break;
                }
            }
            candidates.truncate(cutoff);
        }

        let weights: Vec<f32> = candidates.iter().map(|(_, p)| *p).collect();
        let dist = WeightedIndex::new(&weights)
            .map_err(|e| Error::Config(format!("failed to build sampling distribution: {e}")))?;

        Ok(candidates[dist.sample(&mut self.rng)].0)
    }
}

/// Index of the largest logit.
fn argmax(logits: &[f32]) -> u32 {
    let mut best = 0usize;
    for (i, &l) in logits.iter().enumerate() {
        if l > logits[best] {
            best = i;
        }
    }
    best as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use std::collections::HashSet;

    fn sampler(temperature: f32, top_k: usize, top_p: f32, seed: u64) -> Sampler {
        let config = GenerationConfig::default()
            .temperature(temperature)
            .top_k(top_k)
            .top_p(top_p)
            .seed(seed);
        Sampler::new(&config)
    }

    #[test]
    fn greedy_picks_argmax() {
        let mut sampler = sampler(0.0, 0, 1.0, 42);
        let logits = Tensor::new(&[0.1f32, 0.2, 0.3, 10.0, 0.4], &Device::Cpu).unwrap();

        assert_eq!(sampler.sample(&logits).unwrap(), 3);
    }

    #[test]
    fn uniform_logits_sample_different_tokens() {
        let mut sampler = sampler(1.0, 0, 1.0, 42);
        let logits = Tensor::new(&[1.0f32, 1.0, 1.0, 1.0, 1.0], &Device::Cpu).unwrap();

        let mut seen = HashSet::new();
        for _ in 0..100 {
            seen.insert(sampler.sample(&logits).unwrap());
        }

        assert!(seen.len() > 1, "should sample different tokens");
    }

    #[test]
    fn top_k_restricts_support() {
        let mut sampler = sampler(1.0, 2, 1.0, 42);
        let logits = Tensor::new(&[0.1f32, 0.2, 0.3, 10.0, 9.0], &Device::Cpu).unwrap();

        for _ in 0..50 {
            let token = sampler.sample(&logits).unwrap();
            assert!(token == 3 || token == 4);
        }
    }

    #[test]
    fn top_p_keeps_dominant_token() {
        let mut sampler = sampler(1.0, 0, 0.5, 42);
        let logits = Tensor::new(&[0.0f32, 0.0, 0.0, 10.0, 0.0], &Device::Cpu).unwrap();

        for _ in 0..10 {
            assert_eq!(sampler.sample(&logits).unwrap(), 3);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let logits = Tensor::new(&[1.0f32, 1.0, 1.0, 1.0, 1.0], &Device::Cpu).unwrap();

        let mut a = sampler(1.0, 0, 1.0, 12345);
        let mut b = sampler(1.0, 0, 1.0, 12345);

        let seq_a: Vec<u32> = (0..10).map(|_| a.sample(&logits).unwrap()).collect();
        let seq_b: Vec<u32> = (0..10).map(|_| b.sample(&logits).unwrap()).collect();

        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn batch_shaped_logits_are_accepted() {
        let mut sampler = sampler(0.0, 0, 1.0, 42);
        let logits = Tensor::new(&[[0.1f32, 5.0, 0.3]], &Device::Cpu).unwrap();

        assert_eq!(sampler.sample(&logits).unwrap(), 1);
    }
}
