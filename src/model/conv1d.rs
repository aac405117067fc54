//! GPT-2 style linear projection.
//!
//! GPT-2 checkpoints store their projection weights input-major
//! (`[in_features, out_features]`, the layout HuggingFace calls `Conv1D`),
//! so the forward pass is a plain `x @ w + b` without a transpose. Keeping
//! the checkpoint layout lets pretrained weights load unchanged.

use candle_core::{Result, Tensor};
use candle_nn::{Init, VarBuilder};

/// Linear projection with input-major weight layout.
#[derive(Debug, Clone)]
pub struct Conv1D {
    /// Weight tensor [in_features, out_features].
    weight: Tensor,
    /// Bias tensor [out_features].
    bias: Tensor,
}

impl Conv1D {
    /// Creates a Conv1D from existing tensors.
    pub fn new(weight: Tensor, bias: Tensor) -> Self {
        Self { weight, bias }
    }

    /// Loads (or initializes) the projection from a VarBuilder.
    ///
    /// Backed by SafeTensors the init hints are ignored; backed by a
    /// `VarMap` they produce the GPT-2 initialization (N(0, 0.02) weights,
    /// zero bias).
    pub fn load(in_features: usize, out_features: usize, vb: VarBuilder) -> Result<Self> {
        let weight = vb.get_with_hints(
            (in_features, out_features),
            "weight",
            Init::Randn {
                mean: 0.0,
                stdev: 0.02,
            },
        )?;
        let bias = vb.get_with_hints((out_features,), "bias", Init::Const(0.0))?;
        Ok(Self { weight, bias })
    }

    /// Returns the weight tensor.
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// Forward pass: `x @ w + b`.
    ///
    /// # Arguments
    ///
    /// * `x` - Input tensor [..., in_features]
    ///
    /// # Returns
    ///
    /// Output tensor [..., out_features]
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        x.broadcast_matmul(&self.weight)?.broadcast_add(&self.bias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn forward_shape() {
        let device = Device::Cpu;
        let weight = Tensor::randn(0.0f32, 0.02, (8, 24), &device).unwrap();
        let bias = Tensor::zeros(24, DType::F32, &device).unwrap();
        let proj = Conv1D::new(weight, bias);

        let x = Tensor::randn(0.0f32, 1.0, (2, 4, 8), &device).unwrap();
        let y = proj.forward(&x).unwrap();

        assert_eq!(y.dims(), &[2, 4, 24]);
    }

    #[test]
    fn bias_is_added() {
        let device = Device::Cpu;
        let weight = Tensor::zeros((4, 3), DType::F32, &device).unwrap();
        let bias = Tensor::new(&[1.0f32, 2.0, 3.0], &device).unwrap();
        let proj = Conv1D::new(weight, bias);

        let x = Tensor::ones((1, 2, 4), DType::F32, &device).unwrap();
        let y = proj.forward(&x).unwrap();
        let values: Vec<f32> = y.flatten_all().unwrap().to_vec1().unwrap();

        assert_eq!(values, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }
}
