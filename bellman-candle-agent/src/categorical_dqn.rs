//! CategoricalDQN (C51) agent.
//!
//! The value function outputs `n_actions * num_atoms` logits. A softmax over the
//! atoms gives, for each action, a distribution of the return on a fixed
//! [`Support`]. Action values are the expectations of these distributions.
//! Training minimizes the cross-entropy between the predicted distribution of
//! the taken action and the Bellman update of the next-state distribution,
//! projected back onto the support with [`project_distribution`].
mod projection;
use crate::{
    agent::{QAgent, QAgentConfig, RuleConfig, TensorBatch, UpdateRule},
    mlp::Mlp,
    model::{QModel, SubModel1},
    opt::OptimizerConfig,
    util::{argmax_first, CriticLoss, InOutDim},
};
use anyhow::Result;
use bellman_core::{error::BellmanError, ExperienceReplay, ExperienceReplayConfig, ReplayMemory};
use candle_core::{Tensor, D};
use candle_nn::ops::{log_softmax, softmax};
pub use projection::{project_distribution, Support};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

/// CategoricalDQN agent.
pub type CategoricalDqn<Q = Mlp, M = ExperienceReplay> = QAgent<Q, M, CategoricalRule>;

/// Configuration of [`CategoricalDqn`].
pub type CategoricalDqnConfig<QC = crate::mlp::MlpConfig, MC = ExperienceReplayConfig> =
    QAgentConfig<QC, MC, CategoricalRuleConfig>;

/// Parameters of the support of the return distribution.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CategoricalRuleConfig {
    pub(crate) num_atoms: usize,
    pub(crate) r_min: f32,
    pub(crate) r_max: f32,
}

impl Default for CategoricalRuleConfig {
    fn default() -> Self {
        Self {
            num_atoms: 51,
            r_min: -2.0,
            r_max: 2.0,
        }
    }
}

impl RuleConfig for CategoricalRuleConfig {
    const KIND: &'static str = "CategoricalDQN";

    fn validate(&self) -> Result<()> {
        Support::new(self.r_min, self.r_max, self.num_atoms).map(|_| ())
    }

    fn check_loss(&self, loss: &CriticLoss) -> Result<()> {
        match loss {
            CriticLoss::CrossEntropy => Ok(()),
            _ => Err(BellmanError::config(format!(
                "{} is trained with {}, got {}",
                Self::KIND,
                CriticLoss::CrossEntropy,
                loss
            ))
            .into()),
        }
    }

    fn default_loss() -> CriticLoss {
        CriticLoss::CrossEntropy
    }

    fn default_opt_config() -> OptimizerConfig {
        OptimizerConfig::adam(0.01)
    }

    fn out_dim(&self, n_actions: usize) -> usize {
        n_actions * self.num_atoms
    }

    fn describe(&self) -> String {
        format!("-{}-{}-{}", self.num_atoms, self.r_min, self.r_max)
    }
}

impl<QC, MC> QAgentConfig<QC, MC, CategoricalRuleConfig> {
    /// Sets the number of atoms of the support.
    pub fn num_atoms(mut self, v: usize) -> Self {
        self.rule.num_atoms = v;
        self
    }

    /// Sets the bounds of the support.
    pub fn value_range(mut self, r_min: f32, r_max: f32) -> Self {
        self.rule.r_min = r_min;
        self.rule.r_max = r_max;
        self
    }
}

/// Update rule of CategoricalDQN.
pub struct CategoricalRule {
    support: Support,
    // [1, 1, num_atoms]
    atoms: Tensor,
}

impl CategoricalRule {
    /// Support of the return distributions.
    pub fn support(&self) -> &Support {
        &self.support
    }

    /// Log-probabilities, `[batch_size, n_actions, num_atoms]`.
    fn log_probs<Q>(&self, qnet: &QModel<Q>, obs: &Tensor) -> Result<Tensor>
    where
        Q: SubModel1<Input = Tensor, Output = Tensor>,
        Q::Config: Clone,
    {
        log_softmax(&self.logits(qnet, obs)?, D::Minus1).map_err(Into::into)
    }

    /// Probabilities, `[batch_size, n_actions, num_atoms]`.
    pub fn probs<Q>(&self, qnet: &QModel<Q>, obs: &Tensor) -> Result<Tensor>
    where
        Q: SubModel1<Input = Tensor, Output = Tensor>,
        Q::Config: Clone,
    {
        softmax(&self.logits(qnet, obs)?, D::Minus1).map_err(Into::into)
    }

    fn logits<Q>(&self, qnet: &QModel<Q>, obs: &Tensor) -> Result<Tensor>
    where
        Q: SubModel1<Input = Tensor, Output = Tensor>,
        Q::Config: Clone,
    {
        let xs = qnet.forward(obs)?;
        let (batch_size, out_dim) = xs.dims2()?;
        let num_atoms = self.support.num_atoms();
        if out_dim % num_atoms != 0 {
            return Err(BellmanError::shape_mismatch(
                format!("a multiple of {} outputs", num_atoms),
                out_dim,
            )
            .into());
        }
        Ok(xs.reshape((batch_size, out_dim / num_atoms, num_atoms))?)
    }

    fn expectation(&self, probs: &Tensor) -> Result<Tensor> {
        Ok(probs.broadcast_mul(&self.atoms)?.sum(D::Minus1)?)
    }
}

impl<Q> UpdateRule<Q> for CategoricalRule
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone,
{
    type Config = CategoricalRuleConfig;

    fn build(config: &Self::Config, qnet: &QModel<Q>) -> Result<Self> {
        let support = Support::new(config.r_min, config.r_max, config.num_atoms)?;
        let atoms = Tensor::from_slice(support.atoms(), (1, 1, support.num_atoms()), qnet.device())?;
        Ok(Self { support, atoms })
    }

    fn action_values(&self, qnet: &QModel<Q>, obs: &Tensor) -> Result<Tensor> {
        self.expectation(&self.probs(qnet, obs)?.detach())
    }

    fn loss(
        &self,
        qnet: &QModel<Q>,
        batch: &TensorBatch,
        gamma: f64,
        _loss: &CriticLoss,
    ) -> Result<Tensor> {
        // Distribution of the greedy next action
        let next_probs = self.probs(qnet, &batch.next_obs)?.detach();
        let q_next = self.expectation(&next_probs)?.to_vec2::<f32>()?;
        let next_probs = next_probs.to_vec3::<f32>()?;
        let next_probs = q_next
            .iter()
            .zip(next_probs)
            .map(|(q, mut p)| p.swap_remove(argmax_first(q)))
            .collect::<Vec<_>>();

        let dones = batch.is_done_host.iter().map(|d| *d != 0).collect::<Vec<_>>();
        let m = project_distribution(
            &next_probs,
            &batch.reward_host,
            &dones,
            gamma as f32,
            &self.support,
        );
        let m = Tensor::from_vec(
            m.concat(),
            (batch.len(), self.support.num_atoms()),
            batch.obs.device(),
        )?;

        // Log-probabilities of the taken actions, [batch_size, num_atoms]
        let log_p = self
            .log_probs(qnet, &batch.obs)?
            .broadcast_mul(&batch.act_one_hot.unsqueeze(2)?)?
            .sum(1)?;

        Ok((m * log_p)?.sum(D::Minus1)?.neg()?.mean_all()?)
    }
}

impl<Q, M> QAgent<Q, M, CategoricalRule>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Default + InOutDim,
    M: ReplayMemory,
{
    /// Support of the return distributions.
    pub fn support(&self) -> &Support {
        self.rule.support()
    }

    /// Return distribution of each action for one observation.
    pub fn distributions(&self, obs: &[f32]) -> Result<Vec<Vec<f32>>> {
        self.observation_space.check(obs)?;
        let obs = Tensor::from_slice(obs, (1, obs.len()), &self.device)?;
        let probs = self.rule.probs(&self.qnet, &obs)?;
        Ok(probs.squeeze(0)?.to_vec2::<f32>()?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bellman_core::{Agent, Space, Transition};

    fn config() -> CategoricalDqnConfig {
        CategoricalDqnConfig::default()
            .num_atoms(11)
            .value_range(-1.0, 1.0)
            .batch_size(3)
            .step_train(1)
            .min_transitions_warmup(3)
    }

    #[test]
    fn test_defaults() {
        let config = CategoricalDqnConfig::<crate::mlp::MlpConfig, ExperienceReplayConfig>::default();
        assert_eq!(config.get_loss(), CriticLoss::CrossEntropy);
        assert_eq!(config.get_rule_config().num_atoms, 51);
        assert_eq!(config.get_model_config().get_opt_config().get_learning_rate(), 0.01);
    }

    #[test]
    fn test_invalid_support() {
        for config in [config().num_atoms(1), config().value_range(1.0, 1.0)] {
            let result: Result<CategoricalDqn> =
                CategoricalDqn::build(config, Space::boxed(&[2]), Space::discrete(2));
            let err = result.err().unwrap();
            assert!(matches!(
                err.downcast_ref::<BellmanError>(),
                Some(BellmanError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_distributions() -> Result<()> {
        let agent: CategoricalDqn = CategoricalDqn::build(config(), Space::boxed(&[2]), Space::discrete(3))?;
        let obs = [0.2, -0.4];
        let dists = agent.distributions(&obs)?;
        assert_eq!(dists.len(), 3);
        for p in dists.iter() {
            assert_eq!(p.len(), 11);
            assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }

        let values = agent.action_values(&obs)?;
        for (p, v) in dists.iter().zip(values.iter()) {
            let e: f32 = p.iter().zip(agent.support().atoms()).map(|(p, z)| p * z).sum();
            assert!((e - v).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_training_step() -> Result<()> {
        let mut agent: CategoricalDqn =
            CategoricalDqn::build(config(), Space::boxed(&[2]), Space::discrete(2))?;
        assert!(agent
            .learn(Transition::new(vec![0.0, 1.0], 0, 1.0, vec![1.0, 0.0], false))?
            .is_none());
        assert!(agent
            .learn(Transition::new(vec![1.0, 0.0], 1, 0.0, vec![0.0, 0.0], false))?
            .is_none());
        let record = agent
            .learn(Transition::new(vec![0.0, 0.0], 1, -1.0, vec![0.0, 0.0], true))?
            .unwrap();

        let loss = record.get_scalar("loss")?;
        assert!(loss.is_finite() && loss >= 0.0);
        assert_eq!(agent.n_opts(), 1);
        Ok(())
    }
}
