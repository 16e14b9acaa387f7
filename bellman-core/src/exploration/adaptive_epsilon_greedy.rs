use super::GreedyExploration;
use crate::error::BellmanError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Epsilon-greedy exploration with a linearly decaying epsilon.
///
/// ```text
/// eps(step) = eps_max                                    if step < step_offset
///           = eps_max - (eps_max - eps_min) * k / decay   if k = step - step_offset < decay
///           = eps_min                                    otherwise
/// ```
///
/// With `decay_steps == 0` epsilon drops to `eps_min` at `step_offset`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct AdaptiveEpsilonGreedy {
    pub(super) epsilon_max: f64,
    pub(super) epsilon_min: f64,
    pub(super) decay_steps: usize,
    #[serde(default)]
    pub(super) step_offset: usize,
}

impl AdaptiveEpsilonGreedy {
    /// Constructs the policy.
    ///
    /// Both bounds must be in `[0, 1]` and `epsilon_max >= epsilon_min`.
    pub fn new(
        epsilon_max: f64,
        epsilon_min: f64,
        decay_steps: usize,
        step_offset: usize,
    ) -> Result<Self> {
        let e = Self {
            epsilon_max,
            epsilon_min,
            decay_steps,
            step_offset,
        };
        e.validate()?;
        Ok(e)
    }

    /// Upper bound of epsilon, used until `step_offset`.
    pub fn epsilon_max(&self) -> f64 {
        self.epsilon_max
    }

    /// Lower bound of epsilon, reached at `step_offset + decay_steps`.
    pub fn epsilon_min(&self) -> f64 {
        self.epsilon_min
    }

    pub(super) fn validate(&self) -> Result<()> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.epsilon_max) || !unit.contains(&self.epsilon_min) {
            return Err(BellmanError::config(format!(
                "epsilon bounds must be in [0, 1], got [{}, {}]",
                self.epsilon_min, self.epsilon_max
            ))
            .into());
        }
        if self.epsilon_max < self.epsilon_min {
            return Err(BellmanError::config(format!(
                "epsilon_max ({}) must not be smaller than epsilon_min ({})",
                self.epsilon_max, self.epsilon_min
            ))
            .into());
        }
        Ok(())
    }
}

impl GreedyExploration for AdaptiveEpsilonGreedy {
    fn epsilon(&self, step: usize) -> f64 {
        if step < self.step_offset {
            return self.epsilon_max;
        }
        let k = step - self.step_offset;
        if k >= self.decay_steps {
            return self.epsilon_min;
        }
        let frac = k as f64 / self.decay_steps as f64;
        self.epsilon_max - (self.epsilon_max - self.epsilon_min) * frac
    }
}

impl fmt::Display for AdaptiveEpsilonGreedy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AdaptiveEpsilonGreedy-{}-{}-{}-{}",
            self.epsilon_max, self.epsilon_min, self.decay_steps, self.step_offset
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_bounds() -> Result<()> {
        let e = AdaptiveEpsilonGreedy::new(0.8, 0.1, 100, 0)?;
        assert_eq!(e.epsilon(0), 0.8);
        assert_eq!(e.epsilon(100), 0.1);
        assert_eq!(e.epsilon(10_000), 0.1);
        assert!((e.epsilon(50) - 0.45).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_monotone_non_increasing() -> Result<()> {
        let e = AdaptiveEpsilonGreedy::new(0.3, 0.1, 300, 20)?;
        let mut prev = e.epsilon(0);
        for step in 1..1000 {
            let eps = e.epsilon(step);
            assert!(eps <= prev);
            assert!(eps >= 0.1);
            prev = eps;
        }
        assert_eq!(e.epsilon(20), 0.3);
        assert_eq!(e.epsilon(320), 0.1);
        Ok(())
    }

    #[test]
    fn test_zero_decay_steps() -> Result<()> {
        let e = AdaptiveEpsilonGreedy::new(0.9, 0.2, 0, 5)?;
        assert_eq!(e.epsilon(0), 0.9);
        assert_eq!(e.epsilon(5), 0.2);
        Ok(())
    }

    #[test]
    fn test_invalid_bounds() {
        for (max, min) in [(0.1, 0.8), (1.5, 0.1), (0.5, -0.1)] {
            let err = AdaptiveEpsilonGreedy::new(max, min, 10, 0).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<BellmanError>(),
                Some(BellmanError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_be_greedy_at_floor() -> Result<()> {
        let e = AdaptiveEpsilonGreedy::new(1.0, 0.0, 10, 0)?;
        let mut rng = SmallRng::seed_from_u64(3);
        assert!((0..100).all(|_| !e.be_greedy(0, &mut rng)));
        assert!((0..100).all(|_| e.be_greedy(10, &mut rng)));
        Ok(())
    }
}
