//! Agent.
use super::Transition;
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// A value-based agent that acts on an environment and learns from transitions.
///
/// The environment driver interacts with an agent as follows:
///
/// ```mermaid
/// graph LR
///     Env -->|observation|Agent
///     Agent -->|action|Env
///     Env -->|Transition|Agent
///     Agent -->|append|ReplayMemory
///     ReplayMemory -->|batch, every step_train|Agent
/// ```
///
/// `act`, `learn` and `train` must not be called concurrently on the same agent.
pub trait Agent {
    /// Selects an action for a flattened observation.
    fn act(&mut self, obs: &[f32]) -> Result<usize>;

    /// Stores a transition and trains the agent at its training cadence.
    ///
    /// Returns the record of the optimization step if one was performed. If
    /// training fails, the transition stays stored and the step counter stays
    /// advanced.
    fn learn(&mut self, transition: Transition) -> Result<Option<Record>>;

    /// Performs one optimization step on a batch sampled from the replay memory.
    fn train(&mut self) -> Result<Record>;

    /// Called by the driver at the end of each episode.
    fn episode_finished(&mut self) -> Result<()> {
        Ok(())
    }

    /// Allows random actions in [`Agent::act`].
    fn enable_exploration(&mut self);

    /// Makes [`Agent::act`] always greedy.
    fn disable_exploration(&mut self);

    /// Saves the full state of the agent, except the replay memory, in the given directory.
    fn save(&self, path: &Path) -> Result<()>;

    /// Loads an agent saved with [`Agent::save`].
    fn load(path: &Path) -> Result<Self>
    where
        Self: Sized;
}
