//! GPT-2 feed-forward network.
//!
//! Two projections around a GELU activation, with the intermediate
//! dimension fixed at four times the embedding dimension as in the
//! original architecture.

use candle_core::{Result, Tensor};
use candle_nn::VarBuilder;

use super::conv1d::Conv1D;
use super::loader::Gpt2Config;

/// GPT-2 MLP: `c_proj(gelu(c_fc(x)))`.
#[derive(Debug, Clone)]
pub struct Mlp {
    /// Expansion projection [n_embd] -> [4 * n_embd].
    c_fc: Conv1D,
    /// Contraction projection [4 * n_embd] -> [n_embd].
    c_proj: Conv1D,
}

impl Mlp {
    /// Creates the MLP from a VarBuilder.
    pub fn new(config: &Gpt2Config, vb: VarBuilder) -> Result<Self> {
        let n_embd = config.n_embd;
        let c_fc = Conv1D::load(n_embd, 4 * n_embd, vb.pp("c_fc"))?;
        let c_proj = Conv1D::load(4 * n_embd, n_embd, vb.pp("c_proj"))?;
        Ok(Self { c_fc, c_proj })
    }

    /// Forward pass through the MLP.
    ///
    /// # Arguments
    ///
    /// * `x` - Input tensor [..., n_embd]
    ///
    /// # Returns
    ///
    /// Output tensor [..., n_embd]
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        // GPT-2 uses the tanh-approximated GELU.
        let hidden = self.c_fc.forward(x)?.gelu()?;
        self.c_proj.forward(&hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::{VarBuilder, VarMap};

    #[test]
    fn forward_shape() {
        let config = Gpt2Config::tiny(50);
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = Mlp::new(&config, vb).unwrap();

        let x = Tensor::randn(0.0f32, 1.0, (2, 3, config.n_embd), &Device::Cpu).unwrap();
        let y = mlp.forward(&x).unwrap();

        assert_eq!(y.dims(), &[2, 3, config.n_embd]);
    }
}
