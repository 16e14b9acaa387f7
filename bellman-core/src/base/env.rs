//! Environment.
use super::Step;
use crate::Space;
use anyhow::Result;

/// Represents an environment with a discrete action space, typically an MDP.
///
/// Observations are exchanged as flattened `f32` vectors whose length is
/// `observation_space().flat_dim()`.
pub trait Env {
    /// Space of observations.
    fn observation_space(&self) -> Space;

    /// Space of actions. Agents require a [`Space::Discrete`].
    fn action_space(&self) -> Space;

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Performs an environment step.
    fn step(&mut self, act: usize) -> Result<Step>;
}
