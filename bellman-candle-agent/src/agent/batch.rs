use crate::util::one_hot;
use anyhow::Result;
use bellman_core::TransitionBatch;
use candle_core::{Device, Tensor};

/// A batch of transitions on the device of an agent.
pub struct TensorBatch {
    /// Observations, `[batch_size, obs_dim]`.
    pub obs: Tensor,

    /// Actions.
    pub act: Vec<usize>,

    /// One-hot encodings of the actions, `[batch_size, n_actions]`.
    pub act_one_hot: Tensor,

    /// Rewards, `[batch_size]`.
    pub reward: Tensor,

    /// Next observations, `[batch_size, obs_dim]`.
    pub next_obs: Tensor,

    /// `0` for terminal transitions and `1` otherwise, `[batch_size]`.
    pub not_done: Tensor,

    /// Rewards on the host.
    pub reward_host: Vec<f32>,

    /// Terminal flags on the host.
    pub is_done_host: Vec<i8>,
}

impl TensorBatch {
    /// Moves a batch sampled from a replay memory to `device`.
    pub fn new(batch: TransitionBatch, n_actions: usize, device: &Device) -> Result<Self> {
        let n = batch.len();
        let d = batch.obs_dim;
        let (obs, act, next_obs, reward, is_done) = batch.unpack();
        let not_done = is_done.iter().map(|v| (1 - v) as f32).collect::<Vec<_>>();

        Ok(Self {
            obs: Tensor::from_vec(obs, (n, d), device)?,
            act_one_hot: one_hot(&act, n_actions, device)?,
            act,
            reward: Tensor::from_slice(&reward[..], (n,), device)?,
            next_obs: Tensor::from_vec(next_obs, (n, d), device)?,
            not_done: Tensor::from_vec(not_done, (n,), device)?,
            reward_host: reward,
            is_done_host: is_done,
        })
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.act.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.act.is_empty()
    }
}
