#![warn(missing_docs)]
//! Core components of value-based reinforcement learning agents.
//!
//! This crate provides the backend-agnostic pieces shared by the agents:
//!
//! * [`Space`] describes observations and the discrete action set.
//! * [`Transition`] is one observed step `(o_t, a_t, r_t, o_t+1, done_t)`.
//! * [`Exploration`] decides whether an agent acts greedily at a given step.
//! * [`ReplayMemory`] stores transitions and samples mini-batches;
//!   [`ExperienceReplay`] is a bounded FIFO implementation.
//! * [`Agent`] and [`Env`] are the interfaces between agents and environments,
//!   and [`util::run_episodes`] drives one with the other.
//!
//! Agents implemented on a tensor backend live in a separate crate.
pub mod dummy;
pub mod error;
pub mod exploration;
pub mod memory;
pub mod record;
pub mod util;

mod base;
pub use base::{Agent, Env, Step, Transition};

mod space;
pub use exploration::{AdaptiveEpsilonGreedy, EpsilonGreedy, Exploration, GreedyExploration};
pub use memory::{ExperienceReplay, ExperienceReplayConfig, ReplayMemory, TransitionBatch};
pub use space::Space;
