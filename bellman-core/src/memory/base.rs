use super::TransitionBatch;
use crate::Transition;
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Interface of replay memories used by agents.
///
/// Agents build their memory from [`ReplayMemory::Config`], so two agents never
/// share a memory instance. The configuration is persisted with the agent.
pub trait ReplayMemory {
    /// Configuration from which the memory is built.
    type Config: Clone + std::fmt::Debug + PartialEq + Serialize + DeserializeOwned;

    /// Builds an empty memory.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Returns the configuration of the memory.
    fn config(&self) -> &Self::Config;

    /// Stores a transition, evicting the oldest one if the memory is full.
    fn append(&mut self, transition: Transition);

    /// Samples `size` transitions.
    ///
    /// Fails with [`BellmanError::InsufficientData`] if fewer than `size`
    /// transitions are stored.
    ///
    /// [`BellmanError::InsufficientData`]: crate::error::BellmanError::InsufficientData
    fn sample(&mut self, size: usize) -> Result<TransitionBatch>;

    /// Number of stored transitions.
    fn len(&self) -> usize;

    /// Returns `true` if no transition is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of stored transitions.
    fn capacity(&self) -> usize;

    /// Removes all transitions.
    fn clear(&mut self);
}
