//! Observation and action spaces.
use crate::error::BellmanError;
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Descriptor of an observation or action space.
///
/// Observations handed to agents are always flattened `f32` vectors of length
/// [`Space::flat_dim`]. Actions must live in a [`Space::Discrete`] space.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum Space {
    /// `n` distinct values `0..n`, flattened to a one-hot vector of length `n`.
    Discrete {
        /// Cardinality.
        n: usize,
    },

    /// A real-valued array of the given shape, flattened row-major.
    Box {
        /// Shape of the array.
        shape: Vec<usize>,
    },
}

impl Space {
    /// Discrete space with `n` elements.
    pub fn discrete(n: usize) -> Self {
        Self::Discrete { n }
    }

    /// Real-valued space with the given shape.
    pub fn boxed(shape: &[usize]) -> Self {
        Self::Box {
            shape: shape.to_vec(),
        }
    }

    /// Length of the flattened representation.
    pub fn flat_dim(&self) -> usize {
        match self {
            Self::Discrete { n } => *n,
            Self::Box { shape } => shape.iter().product(),
        }
    }

    /// Cardinality of a discrete space.
    ///
    /// Fails with a configuration error for any other kind of space; agents call
    /// this on their action space at construction.
    pub fn n(&self) -> Result<usize> {
        match self {
            Self::Discrete { n } if *n > 0 => Ok(*n),
            Self::Discrete { .. } => {
                Err(BellmanError::config("a discrete space needs at least one element").into())
            }
            _ => Err(BellmanError::config(format!(
                "expected a discrete space, got {}",
                self
            ))
            .into()),
        }
    }

    /// Draws a uniformly random element of a discrete space.
    pub fn sample(&self, rng: &mut impl Rng) -> Result<usize> {
        let n = self.n()?;
        Ok(rng.gen_range(0..n))
    }

    /// One-hot encoding of an element of a discrete space.
    pub fn one_hot(&self, ix: usize) -> Result<Vec<f32>> {
        let n = self.n()?;
        if ix >= n {
            return Err(BellmanError::shape_mismatch(format!("index < {}", n), ix).into());
        }
        let mut v = vec![0f32; n];
        v[ix] = 1.0;
        Ok(v)
    }

    /// Checks that `obs` is a flattened element of this space.
    pub fn check(&self, obs: &[f32]) -> Result<()> {
        let dim = self.flat_dim();
        if obs.len() != dim {
            return Err(BellmanError::shape_mismatch(
                format!("vector of length {} for {}", dim, self),
                format!("vector of length {}", obs.len()),
            )
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discrete { n } => write!(f, "Discrete({})", n),
            Self::Box { shape } => write!(f, "Box({:?})", shape),
        }
    }
}
