//! Columnar batch of transitions.
use crate::Transition;

/// A batch of transitions stored column by column.
///
/// Observations are stacked row-major: row `i` of `obs` is
/// `obs[i * obs_dim..(i + 1) * obs_dim]`, so the buffer can be viewed as a
/// `[len, obs_dim]` matrix without copying.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionBatch {
    /// Length of a flattened observation.
    pub obs_dim: usize,

    /// Observations `o_t`, `[len, obs_dim]`.
    pub obs: Vec<f32>,

    /// Actions `a_t`.
    pub act: Vec<usize>,

    /// Rewards `r_t`.
    pub reward: Vec<f32>,

    /// Observations `o_t+1`, `[len, obs_dim]`.
    pub next_obs: Vec<f32>,

    /// Terminal flags, `1` for terminal transitions.
    pub is_done: Vec<i8>,

    /// Positions of the sampled transitions in the memory.
    pub ix_sample: Vec<usize>,
}

impl TransitionBatch {
    /// Stacks the given transitions.
    ///
    /// All observations are expected to have the same length.
    pub fn from_transitions<'a>(
        transitions: impl IntoIterator<Item = (usize, &'a Transition)>,
    ) -> Self {
        let mut batch = Self {
            obs_dim: 0,
            obs: vec![],
            act: vec![],
            reward: vec![],
            next_obs: vec![],
            is_done: vec![],
            ix_sample: vec![],
        };

        for (ix, tr) in transitions {
            debug_assert!(batch.obs_dim == 0 || batch.obs_dim == tr.obs.len());
            batch.obs_dim = tr.obs.len();
            batch.obs.extend_from_slice(&tr.obs);
            batch.act.push(tr.act);
            batch.reward.push(tr.reward);
            batch.next_obs.extend_from_slice(&tr.next_obs);
            batch.is_done.push(tr.done as i8);
            batch.ix_sample.push(ix);
        }

        batch
    }

    /// Number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Reconstructs the `i`-th transition of the batch.
    pub fn transition(&self, i: usize) -> Transition {
        let d = self.obs_dim;
        Transition {
            obs: self.obs[i * d..(i + 1) * d].to_vec(),
            act: self.act[i],
            reward: self.reward[i],
            next_obs: self.next_obs[i * d..(i + 1) * d].to_vec(),
            done: self.is_done[i] == 1,
        }
    }

    /// Unpacks the data `(o_t, a_t, o_t+1, r_t, is_done_t)`.
    pub fn unpack(self) -> (Vec<f32>, Vec<usize>, Vec<f32>, Vec<f32>, Vec<i8>) {
        (self.obs, self.act, self.next_obs, self.reward, self.is_done)
    }
}
