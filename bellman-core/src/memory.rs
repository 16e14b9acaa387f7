//! Replay memories.
//!
//! A replay memory stores transitions and produces randomized, columnar
//! mini-batches for training. [`ExperienceReplay`] is a bounded FIFO memory with
//! uniform sampling without replacement.
mod base;
mod batch;
mod config;
mod experience_replay;
pub use base::ReplayMemory;
pub use batch::TransitionBatch;
pub use config::ExperienceReplayConfig;
pub use experience_replay::ExperienceReplay;
