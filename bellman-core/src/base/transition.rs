//! Transitions and environment steps.
use crate::{error::BellmanError, Space};
use anyhow::Result;

/// One observed transition `(o_t, a_t, r_t, o_t+1, done_t)`.
///
/// Observations are flattened feature vectors. A transition is not modified after
/// it has been stored in a replay memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Observation `o_t`.
    pub obs: Vec<f32>,

    /// Action `a_t`.
    pub act: usize,

    /// Reward `r_t`.
    pub reward: f32,

    /// Observation `o_t+1`.
    pub next_obs: Vec<f32>,

    /// `true` if `o_t+1` is terminal.
    pub done: bool,
}

impl Transition {
    /// Constructs a transition.
    pub fn new(obs: Vec<f32>, act: usize, reward: f32, next_obs: Vec<f32>, done: bool) -> Self {
        Self {
            obs,
            act,
            reward,
            next_obs,
            done,
        }
    }

    /// Checks the transition against the observation and action spaces.
    pub fn check(&self, obs_space: &Space, act_space: &Space) -> Result<()> {
        obs_space.check(&self.obs)?;
        obs_space.check(&self.next_obs)?;
        let n = act_space.n()?;
        if self.act >= n {
            return Err(BellmanError::shape_mismatch(
                format!("action in [0, {})", n),
                self.act,
            )
            .into());
        }
        Ok(())
    }
}

/// The result of an environment step.
#[derive(Clone, Debug)]
pub struct Step {
    /// Observation after the step.
    pub obs: Vec<f32>,

    /// Reward of the step.
    pub reward: f32,

    /// `true` if the episode ended.
    pub done: bool,
}
