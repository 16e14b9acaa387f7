//! Small environments used in tests.
use crate::{Env, Space, Step};
use anyhow::Result;

/// A corridor of `n` cells.
///
/// The agent starts in cell 0. Action 1 moves right, action 0 moves left. Reaching
/// the last cell gives reward 1 and ends the episode; every other step gives
/// reward 0. Episodes are cut after `max_steps` steps. Observations are one-hot
/// encodings of the current cell.
pub struct ChainEnv {
    n: usize,
    max_steps: usize,
    pos: usize,
    t: usize,
}

impl ChainEnv {
    /// Constructs a corridor of `n >= 2` cells.
    pub fn new(n: usize, max_steps: usize) -> Self {
        debug_assert!(n >= 2);
        Self {
            n,
            max_steps,
            pos: 0,
            t: 0,
        }
    }

    fn obs(&self) -> Result<Vec<f32>> {
        self.observation_space().one_hot(self.pos)
    }
}

impl Env for ChainEnv {
    fn observation_space(&self) -> Space {
        Space::discrete(self.n)
    }

    fn action_space(&self) -> Space {
        Space::discrete(2)
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.pos = 0;
        self.t = 0;
        self.obs()
    }

    fn step(&mut self, act: usize) -> Result<Step> {
        self.action_space().one_hot(act)?;
        self.t += 1;
        self.pos = match act {
            0 => self.pos.saturating_sub(1),
            _ => (self.pos + 1).min(self.n - 1),
        };
        let goal = self.pos == self.n - 1;

        Ok(Step {
            obs: self.obs()?,
            reward: if goal { 1.0 } else { 0.0 },
            done: goal || self.t >= self.max_steps,
        })
    }
}
