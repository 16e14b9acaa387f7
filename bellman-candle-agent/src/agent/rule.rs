use super::TensorBatch;
use crate::{
    model::{QModel, SubModel1},
    opt::OptimizerConfig,
    util::CriticLoss,
};
use anyhow::Result;
use candle_core::Tensor;
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, path::Path};

/// Algorithm-specific part of the configuration of an agent.
pub trait RuleConfig: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Default {
    /// Name of the algorithm, stored in saved agents.
    const KIND: &'static str;

    /// Checks the parameters.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Checks that the algorithm can be trained with `loss`.
    fn check_loss(&self, loss: &CriticLoss) -> Result<()>;

    /// Loss used when none is configured.
    fn default_loss() -> CriticLoss {
        CriticLoss::Mse
    }

    /// Optimizer used when none is configured.
    fn default_opt_config() -> OptimizerConfig {
        OptimizerConfig::default()
    }

    /// Output dimension of the value function for `n_actions` actions.
    fn out_dim(&self, n_actions: usize) -> usize {
        n_actions
    }

    /// Algorithm-specific parameters appended to the description of an agent.
    fn describe(&self) -> String {
        String::new()
    }
}

/// Computes action values and training losses for an agent.
pub trait UpdateRule<Q>: Sized
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone,
{
    /// Configuration of the rule.
    type Config: RuleConfig;

    /// Builds the rule for the given online network.
    fn build(config: &Self::Config, qnet: &QModel<Q>) -> Result<Self>;

    /// Action values for a batch of observations, `[batch_size, n_actions]`.
    fn action_values(&self, qnet: &QModel<Q>, obs: &Tensor) -> Result<Tensor>;

    /// Loss of one training step. Gradients must flow only through the
    /// prediction of `qnet` for `batch.obs`.
    fn loss(
        &self,
        qnet: &QModel<Q>,
        batch: &TensorBatch,
        gamma: f64,
        loss: &CriticLoss,
    ) -> Result<Tensor>;

    /// Called after each learn call with the updated step counter.
    fn after_learn(&mut self, _step: usize, _qnet: &QModel<Q>) -> Result<()> {
        Ok(())
    }

    /// Saves additional state in the directory of a saved agent.
    fn save(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    /// Loads the state saved with [`UpdateRule::save`].
    fn load(&mut self, _dir: &Path) -> Result<()> {
        Ok(())
    }
}
