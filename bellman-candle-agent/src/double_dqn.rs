//! DoubleDQN agent.
//!
//! The next action is selected by the online network and evaluated by a target
//! network: `r + gamma * Q_tgt(o', argmax_a' Q(o', a')) * (1 - done)`. The target
//! network is a hard copy of the online one, refreshed every `step_copy` learn
//! calls.
use crate::{
    agent::{QAgent, QAgentConfig, RuleConfig, TensorBatch, UpdateRule},
    dqn::{check_value_loss, predict_taken, regression_loss},
    mlp::Mlp,
    model::{QModel, SubModel1, TargetQModel},
    util::{CriticLoss, InOutDim},
};
use anyhow::Result;
use bellman_core::{error::BellmanError, ExperienceReplay, ExperienceReplayConfig, ReplayMemory};
use candle_core::{Tensor, D};
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt::Debug, path::Path};

/// DoubleDQN agent.
pub type DoubleDqn<Q = Mlp, M = ExperienceReplay> = QAgent<Q, M, DoubleDqnRule<Q>>;

/// Configuration of [`DoubleDqn`].
pub type DoubleDqnConfig<QC = crate::mlp::MlpConfig, MC = ExperienceReplayConfig> =
    QAgentConfig<QC, MC, DoubleDqnRuleConfig>;

/// Parameters specific to DoubleDQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DoubleDqnRuleConfig {
    pub(crate) step_copy: usize,
}

impl Default for DoubleDqnRuleConfig {
    fn default() -> Self {
        Self { step_copy: 500 }
    }
}

impl RuleConfig for DoubleDqnRuleConfig {
    const KIND: &'static str = "DoubleDQN";

    fn validate(&self) -> Result<()> {
        match self.step_copy {
            0 => Err(BellmanError::config("step_copy must be positive").into()),
            _ => Ok(()),
        }
    }

    fn check_loss(&self, loss: &CriticLoss) -> Result<()> {
        check_value_loss(Self::KIND, loss)
    }

    fn describe(&self) -> String {
        format!("-{}", self.step_copy)
    }
}

impl<QC, MC> QAgentConfig<QC, MC, DoubleDqnRuleConfig> {
    /// Sets the number of learn calls between target synchronizations.
    pub fn step_copy(mut self, v: usize) -> Self {
        self.rule.step_copy = v;
        self
    }
}

/// Update rule of DoubleDQN, owning the target network.
pub struct DoubleDqnRule<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
{
    qnet_tgt: TargetQModel<Q>,
    step_copy: usize,
}

impl<Q> DoubleDqnRule<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone,
{
    /// Target network.
    pub fn qnet_tgt(&self) -> &TargetQModel<Q> {
        &self.qnet_tgt
    }

    /// Overwrites the target network with the parameters of `qnet`.
    pub fn sync(&self, qnet: &QModel<Q>) -> Result<()> {
        self.qnet_tgt.sync(qnet)
    }

    /// Bellman targets of a batch, `[batch_size]`, without gradient.
    pub fn targets(&self, qnet: &QModel<Q>, batch: &TensorBatch, gamma: f64) -> Result<Tensor> {
        let a_next = qnet.forward(&batch.next_obs)?.argmax_keepdim(D::Minus1)?;
        let q_next = self
            .qnet_tgt
            .forward(&batch.next_obs)?
            .gather(&a_next, D::Minus1)?
            .squeeze(D::Minus1)?;
        let tgt = (&batch.reward + ((q_next * &batch.not_done)? * gamma)?)?;
        Ok(tgt.detach())
    }
}

impl<Q> UpdateRule<Q> for DoubleDqnRule<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone,
{
    type Config = DoubleDqnRuleConfig;

    fn build(config: &Self::Config, qnet: &QModel<Q>) -> Result<Self> {
        Ok(Self {
            qnet_tgt: TargetQModel::from_online(qnet)?,
            step_copy: config.step_copy,
        })
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

    fn after_learn(&mut self, step: usize, qnet: &QModel<Q>) -> Result<()> {
        if step % self.step_copy == 0 {
            self.sync(qnet)?;
            debug!("Copied online network to target network at step {}", step);
        }
        Ok(())
    }

    fn save(&self, dir: &Path) -> Result<()> {
        self.qnet_tgt.save(dir.join("qnet_tgt.safetensors"))
    }

    fn load(&mut self, dir: &Path) -> Result<()> {
        self.qnet_tgt.load(dir.join("qnet_tgt.safetensors"))
    }
}

impl<Q, M> QAgent<Q, M, DoubleDqnRule<Q>>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Default + InOutDim,
    M: ReplayMemory,
{
    /// Overwrites the target network with the online network.
    pub fn copy_online_to_target(&mut self) -> Result<()> {
        self.rule.sync(&self.qnet)
    }

    /// Action values of the target network for one observation.
    pub fn target_action_values(&self, obs: &[f32]) -> Result<Vec<f32>> {
        self.observation_space.check(obs)?;
        let obs = Tensor::from_slice(obs, (1, obs.len()), &self.device)?;
        let values = self.rule.qnet_tgt.forward(&obs)?;
        Ok(values.squeeze(0)?.to_vec1::<f32>()?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{opt::OptimizerConfig, util::argmax_first};
    use bellman_core::{Agent, Space, Transition};

    fn config() -> DoubleDqnConfig {
        DoubleDqnConfig::default()
            .batch_size(4)
            .step_copy(3)
            .memory_config(ExperienceReplayConfig::default().capacity(100))
    }

    #[test]
    fn test_target_starts_as_copy() -> Result<()> {
        let agent: DoubleDqn = DoubleDqn::build(config(), Space::boxed(&[2]), Space::discrete(3))?;
        let probe = [0.3, -0.2];
        assert_eq!(agent.action_values(&probe)?, agent.target_action_values(&probe)?);
        Ok(())
    }

    #[test]
    fn test_zero_step_copy() {
        let config = config().step_copy(0);
        let result: Result<DoubleDqn> = DoubleDqn::build(config, Space::boxed(&[2]), Space::discrete(3));
        let err = result.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<BellmanError>(),
            Some(BellmanError::Configuration(_))
        ));
    }

    #[test]
    fn test_sync_every_step_copy() -> Result<()> {
        let config = config().step_train(1).batch_size(1);
        let mut agent: DoubleDqn = DoubleDqn::build(config, Space::boxed(&[2]), Space::discrete(3))?;
        let probe = [0.5, 0.5];
        let tr = || Transition::new(vec![0.5, 0.5], 1, 1.0, vec![0.0, 0.0], false);

        agent.learn(tr())?;
        agent.learn(tr())?;
        assert_ne!(agent.action_values(&probe)?, agent.target_action_values(&probe)?);

        agent.learn(tr())?;
        assert_eq!(agent.action_values(&probe)?, agent.target_action_values(&probe)?);
        Ok(())
    }

    #[test]
    fn test_online_selects_target_evaluates() -> Result<()> {
        let config = config()
            .step_train(1)
            .batch_size(1)
            .step_copy(1000)
            .opt_config(OptimizerConfig::adam(0.05));
        let mut agent: DoubleDqn = DoubleDqn::build(config, Space::boxed(&[2]), Space::discrete(3))?;
        for i in 0..20 {
            let r = if i % 2 == 0 { 1.0 } else { -1.0 };
            agent.learn(Transition::new(vec![0.5, -0.5], i % 3, r, vec![-0.3, 0.8], false))?;
        }

        let next_obs = vec![-0.3, 0.8];
        let online = agent.action_values(&next_obs)?;
        let target = agent.target_action_values(&next_obs)?;
        let (reward, gamma) = (0.5f32, 0.9f32);

        let mut memory = ExperienceReplay::build(&ExperienceReplayConfig::default())?;
        memory.append(Transition::new(vec![0.0, 0.0], 0, reward, next_obs, false));
        let batch = TensorBatch::new(memory.sample(1)?, 3, &candle_core::Device::Cpu)?;
        let tgt = agent.rule().targets(agent.qnet(), &batch, gamma as f64)?.to_vec1::<f32>()?;

        let expected = reward + gamma * target[argmax_first(&online)];
        let max_online = reward + gamma * online.iter().cloned().fold(f32::MIN, f32::max);
        assert!((tgt[0] - expected).abs() < 1e-5);
        assert!((tgt[0] - max_online).abs() > 1e-4);
        Ok(())
    }

    #[test]
    fn test_sync_when_training_fails() -> Result<()> {
        let config = config().step_train(1).batch_size(4).step_copy(1);
        let mut agent: DoubleDqn = DoubleDqn::build(config.clone(), Space::boxed(&[2]), Space::discrete(3))?;
        let other: DoubleDqn = DoubleDqn::build(config, Space::boxed(&[2]), Space::discrete(3))?;
        agent.qnet.load_snapshot(&other.qnet().snapshot()?)?;
        let probe = [0.1, 0.9];
        assert_ne!(agent.action_values(&probe)?, agent.target_action_values(&probe)?);

        let err = agent
            .learn(Transition::new(vec![0.1, 0.9], 0, 1.0, vec![0.0, 0.0], true))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BellmanError>(),
            Some(BellmanError::InsufficientData { .. })
        ));
        assert_eq!(agent.step(), 1);
        assert_eq!(agent.action_values(&probe)?, agent.target_action_values(&probe)?);
        Ok(())
    }

    #[test]
    fn test_display() -> Result<()> {
        let agent: DoubleDqn = DoubleDqn::build(config(), Space::boxed(&[2]), Space::discrete(3))?;
        let s = format!("{}", agent);
        assert!(s.starts_with("DoubleDQN-"));
        assert!(s.ends_with("-3"));
        Ok(())
    }
}
