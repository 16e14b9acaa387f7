//! Bounded FIFO replay memory with uniform sampling.
use super::{ExperienceReplayConfig, ReplayMemory, TransitionBatch};
use crate::{error::BellmanError, Transition};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, seq::index, SeedableRng};
use std::collections::{vec_deque::Iter, VecDeque};

/// A replay memory holding the most recent `capacity` transitions.
///
/// Appending to a full memory evicts the oldest transition. Batches are sampled
/// uniformly without replacement with a random generator seeded from the config,
/// so a memory filled with the same transitions yields the same batches.
pub struct ExperienceReplay {
    config: ExperienceReplayConfig,
    transitions: VecDeque<Transition>,
    rng: StdRng,
}

impl ExperienceReplay {
    /// Iterates over the stored transitions, oldest first.
    pub fn iter(&self) -> Iter<'_, Transition> {
        self.transitions.iter()
    }
}

impl ReplayMemory for ExperienceReplay {
    type Config = ExperienceReplayConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        if config.capacity == 0 {
            return Err(BellmanError::config("capacity of replay memory must be positive").into());
        }

        Ok(Self {
            config: config.clone(),
            transitions: VecDeque::with_capacity(config.capacity.min(1 << 16)),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn append(&mut self, transition: Transition) {
        if self.transitions.len() == self.config.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    fn sample(&mut self, size: usize) -> Result<TransitionBatch> {
        let available = self.transitions.len();
        if size > available {
            return Err(BellmanError::InsufficientData {
                requested: size,
                available,
            }
            .into());
        }

        let ixs = index::sample(&mut self.rng, available, size);
        trace!("Sampled {} of {} transitions", size, available);

        Ok(TransitionBatch::from_transitions(
            ixs.into_iter().map(|ix| (ix, &self.transitions[ix])),
        ))
    }

    fn len(&self) -> usize {
        self.transitions.len()
    }

    fn capacity(&self) -> usize {
        self.config.capacity
    }

    fn clear(&mut self) {
        self.transitions.clear();
    }
}
