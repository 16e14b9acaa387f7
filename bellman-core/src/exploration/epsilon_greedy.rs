use super::GreedyExploration;
use crate::error::BellmanError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Epsilon-greedy exploration with a fixed epsilon.
///
/// Acts greedily with probability `1 - epsilon` regardless of the step.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    pub(super) epsilon: f64,
}

impl EpsilonGreedy {
    /// Constructs the policy; `epsilon` must be in `[0, 1]`.
    pub fn new(epsilon: f64) -> Result<Self> {
        let e = Self { epsilon };
        e.validate()?;
        Ok(e)
    }

    /// Returns the exploration probability.
    pub fn get_epsilon(&self) -> f64 {
        self.epsilon
    }

    pub(super) fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(BellmanError::config(format!(
                "epsilon must be in [0, 1], got {}",
                self.epsilon
            ))
            .into());
        }
        Ok(())
    }
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self { epsilon: 0.1 }
    }
}

impl GreedyExploration for EpsilonGreedy {
    fn epsilon(&self, _step: usize) -> f64 {
        self.epsilon
    }
}

impl fmt::Display for EpsilonGreedy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EpsilonGreedy-{}", self.epsilon)
    }
}
