//! Exploration policies of value-based agents.
//!
//! An exploration policy decides, for a given step index, whether the agent acts
//! greedily with respect to its value function or takes a random action. The step
//! index is owned by the caller; policies hold configuration only.
mod adaptive_epsilon_greedy;
mod epsilon_greedy;
pub use adaptive_epsilon_greedy::AdaptiveEpsilonGreedy;
pub use epsilon_greedy::EpsilonGreedy;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decides between greedy and random action selection.
pub trait GreedyExploration {
    /// Probability of taking a random action at `step`.
    fn epsilon(&self, step: usize) -> f64;

    /// Returns `true` if the agent should act greedily at `step`.
    fn be_greedy(&self, step: usize, rng: &mut impl Rng) -> bool {
        rng.gen::<f64>() >= self.epsilon(step)
    }
}

/// Exploration policies supported by the agents.
///
/// This enum is what agents own and persist; the variant name serves as the
/// identifier of the policy in saved agents.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum Exploration {
    /// Fixed epsilon.
    EpsilonGreedy(EpsilonGreedy),

    /// Epsilon decaying linearly with the step index.
    AdaptiveEpsilonGreedy(AdaptiveEpsilonGreedy),
}

impl Exploration {
    /// Checks the parameters, e.g., after deserialization.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self {
            Self::EpsilonGreedy(e) => e.validate(),
            Self::AdaptiveEpsilonGreedy(e) => e.validate(),
        }
    }
}

impl Default for Exploration {
    fn default() -> Self {
        Self::EpsilonGreedy(EpsilonGreedy::default())
    }
}

impl GreedyExploration for Exploration {
    fn epsilon(&self, step: usize) -> f64 {
        match self {
            Self::EpsilonGreedy(e) => e.epsilon(step),
            Self::AdaptiveEpsilonGreedy(e) => e.epsilon(step),
        }
    }
}

impl From<EpsilonGreedy> for Exploration {
    fn from(e: EpsilonGreedy) -> Self {
        Self::EpsilonGreedy(e)
    }
}

impl From<AdaptiveEpsilonGreedy> for Exploration {
    fn from(e: AdaptiveEpsilonGreedy) -> Self {
        Self::AdaptiveEpsilonGreedy(e)
    }
}

impl fmt::Display for Exploration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EpsilonGreedy(e) => write!(f, "{}", e),
            Self::AdaptiveEpsilonGreedy(e) => write!(f, "{}", e),
        }
    }
}
