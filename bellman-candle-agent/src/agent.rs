//! Agent shared by the value-based algorithms.
//!
//! [`QAgent`] owns everything the algorithms have in common: spaces, the online
//! value function, the replay memory, the exploration policy, hyperparameters and
//! the step counter. What differs between algorithms is captured by an
//! [`UpdateRule`], which computes action values for acting and the loss of a
//! training step, and may keep additional state such as a target network.
mod base;
mod batch;
mod config;
mod rule;
mod snapshot;
pub use base::QAgent;
pub use batch::TensorBatch;
pub use config::QAgentConfig;
pub use rule::{RuleConfig, UpdateRule};
pub use snapshot::{AgentSnapshot, SNAPSHOT_VERSION};
