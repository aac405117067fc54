//! Shared fixtures for integration tests.
//!
//! Everything here is network-free: a tiny whitespace WordLevel tokenizer
//! and randomly initialized models sized to match its vocabulary.
#![allow(dead_code)]

use candle_core::Device;
use candle_nn::VarMap;
use tokenizers::Tokenizer;

use tinygen::model::{Gpt2Config, Gpt2LMHeadModel};
use tinygen::TextGenerator;

/// A 10-token WordLevel tokenizer with an end-of-text token.
pub const TOKENIZER_JSON: &str = r#"{
    "version": "1.0",
    "truncation": null,
    "padding": null,
    "added_tokens": [],
    "normalizer": null,
    "pre_tokenizer": {"type": "Whitespace"},
    "post_processor": null,
    "decoder": null,
    "model": {
        "type": "WordLevel",
        "vocab": {
            "<unk>": 0,
            "<|endoftext|>": 1,
            "hello": 2,
            "world": 3,
            "the": 4,
            "quick": 5,
            "brown": 6,
            "fox": 7,
            "question": 8,
            "context": 9
        },
        "unk_token": "<unk>"
    }
}"#;

/// Same vocabulary without the end-of-text token, for tests that need
/// generation to always exhaust its token budget.
pub const TOKENIZER_JSON_NO_EOS: &str = r#"{
    "version": "1.0",
    "truncation": null,
    "padding": null,
    "added_tokens": [],
    "normalizer": null,
    "pre_tokenizer": {"type": "Whitespace"},
    "post_processor": null,
    "decoder": null,
    "model": {
        "type": "WordLevel",
        "vocab": {
            "<unk>": 0,
            "hello": 1,
            "world": 2,
            "the": 3,
            "quick": 4,
            "brown": 5,
            "fox": 6,
            "question": 7,
            "context": 8,
            "answer": 9
        },
        "unk_token": "<unk>"
    }
}"#;

pub const VOCAB_SIZE: usize = 10;

pub fn tiny_tokenizer() -> Tokenizer {
    Tokenizer::from_bytes(TOKENIZER_JSON.as_bytes()).unwrap()
}

pub fn tiny_config() -> Gpt2Config {
    let mut config = Gpt2Config::tiny(VOCAB_SIZE);
    config.eos_token_id = 1;
    config
}

pub fn tiny_model(config: &Gpt2Config) -> (Gpt2LMHeadModel, VarMap) {
    let varmap = VarMap::new();
    let model = Gpt2LMHeadModel::random(config, &varmap, &Device::Cpu).unwrap();
    (model, varmap)
}

/// Generator over the EOS-carrying tokenizer.
pub fn tiny_generator() -> TextGenerator {
    let (model, _varmap) = tiny_model(&tiny_config());
    TextGenerator::from_parts(model, tiny_tokenizer(), Device::Cpu)
}

/// Generator whose EOS id can never be sampled, so decoding always runs
/// to the configured token budget.
pub fn tiny_generator_no_eos() -> TextGenerator {
    let mut config = Gpt2Config::tiny(VOCAB_SIZE);
    // Outside the vocabulary, and absent from the tokenizer below.
    config.eos_token_id = 9_999;
    let (model, _varmap) = tiny_model(&config);
    let tokenizer = Tokenizer::from_bytes(TOKENIZER_JSON_NO_EOS.as_bytes()).unwrap();
    TextGenerator::from_parts(model, tokenizer, Device::Cpu)
}
