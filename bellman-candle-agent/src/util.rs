//! Utilities.
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use serde::{Deserialize, Serialize};
use std::fmt;
mod named_tensors;
pub use named_tensors::NamedTensors;

/// Critic loss type.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum CriticLoss {
    /// Mean squared error.
    #[default]
    Mse,

    /// Smooth L1 loss.
    SmoothL1,

    /// Cross-entropy between a target distribution and a predicted one.
    ///
    /// Only meaningful for distributional agents.
    CrossEntropy,
}

impl fmt::Display for CriticLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mse => write!(f, "MSELoss"),
            Self::SmoothL1 => write!(f, "SmoothL1Loss"),
            Self::CrossEntropy => write!(f, "CrossEntropyLoss"),
        }
    }
}

/// Interface for setting input and output dimensions of a network configuration.
///
/// Agents derive both dimensions from their spaces, so a configuration does not
/// need to be kept consistent with the environment by hand.
pub trait InOutDim {
    /// Returns the input dimension.
    fn get_in_dim(&self) -> usize;

    /// Sets the input dimension.
    fn set_in_dim(&mut self, v: usize);

    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let device = x.device();
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?.to_device(device)?;
    let m2 = Tensor::new(1f32, device)?.broadcast_sub(&m1)?;
    (((0.5 * m1)? * d.powf(2.0))? + m2 * (d - 0.5))?.mean_all()
}

/// Index of the largest value; the first one wins on ties.
pub fn argmax_first(xs: &[f32]) -> usize {
    let mut best = 0;
    for (i, x) in xs.iter().enumerate() {
        if *x > xs[best] {
            best = i;
        }
    }
    best
}

/// One-hot encodings of `act` as a `[len, n]` tensor.
pub fn one_hot(act: &[usize], n: usize, device: &Device) -> Result<Tensor> {
    let mut data = vec![0f32; act.len() * n];
    for (i, a) in act.iter().enumerate() {
        data[i * n + a] = 1.0;
    }
    Ok(Tensor::from_vec(data, (act.len(), n), device)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_argmax_first() {
        assert_eq!(argmax_first(&[0.0, 2.0, 2.0, 1.0]), 1);
        assert_eq!(argmax_first(&[3.0]), 0);
        assert_eq!(argmax_first(&[-1.0, -1.0]), 0);
    }

    #[test]
    fn test_smooth_l1_loss() -> Result<()> {
        let x = Tensor::from_slice(&[0.0f32, 0.0], (2,), &Device::Cpu)?;
        let y = Tensor::from_slice(&[0.5f32, 3.0], (2,), &Device::Cpu)?;
        let loss = smooth_l1_loss(&x, &y)?.to_scalar::<f32>()?;
        // (0.5 * 0.25 + (3.0 - 0.5)) / 2
        assert!((loss - 1.3125).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_one_hot() -> Result<()> {
        let t = one_hot(&[2, 0], 3, &Device::Cpu)?;
        assert_eq!(
            t.to_vec2::<f32>()?,
            vec![vec![0.0, 0.0, 1.0], vec![1.0, 0.0, 0.0]]
        );
        Ok(())
    }
}
