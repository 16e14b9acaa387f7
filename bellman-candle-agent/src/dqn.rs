//! DQN agent.
//!
//! The target of a transition is `r + gamma * max_a' Q(o', a') * (1 - done)`,
//! computed with the online network and excluded from the gradient.
use crate::{
    agent::{QAgent, QAgentConfig, RuleConfig, TensorBatch, UpdateRule},
    mlp::Mlp,
    model::{QModel, SubModel1},
    util::{smooth_l1_loss, CriticLoss},
};
use anyhow::Result;
use bellman_core::{error::BellmanError, ExperienceReplay, ExperienceReplayConfig};
use candle_core::{Tensor, D};
use candle_nn::loss::mse;
use serde::{Deserialize, Serialize};

/// DQN agent.
#[allow(clippy::upper_case_acronyms)]
pub type Dqn<Q = Mlp, M = ExperienceReplay> = QAgent<Q, M, DqnRule>;

/// Configuration of [`Dqn`].
pub type DqnConfig<QC = crate::mlp::MlpConfig, MC = ExperienceReplayConfig> =
    QAgentConfig<QC, MC, DqnRuleConfig>;

/// DQN has no algorithm-specific parameters.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct DqnRuleConfig {}

impl RuleConfig for DqnRuleConfig {
    const KIND: &'static str = "DQN";

    fn check_loss(&self, loss: &CriticLoss) -> Result<()> {
        check_value_loss(Self::KIND, loss)
    }
}

pub(crate) fn check_value_loss(kind: &str, loss: &CriticLoss) -> Result<()> {
    match loss {
        CriticLoss::Mse | CriticLoss::SmoothL1 => Ok(()),
        CriticLoss::CrossEntropy => {
            Err(BellmanError::config(format!("{} cannot be trained with {}", kind, loss)).into())
        }
    }
}

/// Prediction of the taken actions, `sum_a Q(o, a) * onehot(a_t)`.
pub(crate) fn predict_taken(qnet_out: &Tensor, batch: &TensorBatch) -> Result<Tensor> {
    Ok((qnet_out * &batch.act_one_hot)?.sum(D::Minus1)?)
}

/// Regression loss between predictions and targets.
pub(crate) fn regression_loss(pred: &Tensor, tgt: &Tensor, loss: &CriticLoss) -> Result<Tensor> {
    Ok(match loss {
        CriticLoss::Mse => mse(pred, tgt)?,
        CriticLoss::SmoothL1 => smooth_l1_loss(pred, tgt)?,
        CriticLoss::CrossEntropy => {
            return Err(BellmanError::config("cross-entropy needs a distributional agent").into())
        }
    })
}

/// Update rule of DQN.
pub struct DqnRule;

impl DqnRule {
    /// Bellman targets of a batch, `[batch_size]`, without gradient.
    pub fn targets<Q>(&self, qnet: &QModel<Q>, batch: &TensorBatch, gamma: f64) -> Result<Tensor>
    where
        Q: SubModel1<Input = Tensor, Output = Tensor>,
        Q::Config: Clone,
    {
        let q_next = qnet.forward(&batch.next_obs)?.detach().max(D::Minus1)?;
        let tgt = (&batch.reward + ((q_next * &batch.not_done)? * gamma)?)?;
        Ok(tgt.detach())
    }
}

impl<Q> UpdateRule<Q> for DqnRule
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone,
{
    type Config = DqnRuleConfig;

    fn build(_config: &Self::Config, _qnet: &QModel<Q>) -> Result<Self> {
        Ok(Self)
    }

    fn action_values(&self, qnet: &QModel<Q>, obs: &Tensor) -> Result<Tensor> {
        Ok(qnet.forward(obs)?.detach())
    }

    fn loss(
        &self,
        qnet: &QModel<Q>,
        batch: &TensorBatch,
        gamma: f64,
        loss: &CriticLoss,
    ) -> Result<Tensor> {
        let pred = predict_taken(&qnet.forward(&batch.obs)?, batch)?;
        let tgt = self.targets(qnet, batch, gamma)?;
        regression_loss(&pred, &tgt, loss)
    }
}
