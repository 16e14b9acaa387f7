//! Configuration of [`QAgent`](super::QAgent).
use super::RuleConfig;
use crate::{model::QModelConfig, opt::OptimizerConfig, util::CriticLoss, Device};
use anyhow::Result;
use bellman_core::{error::BellmanError, Exploration};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn default_seed() -> u64 {
    42
}

/// Configuration of [`QAgent`](super::QAgent).
///
/// * `QC` - configuration of the action-value function.
/// * `MC` - configuration of the replay memory.
/// * `RC` - algorithm-specific configuration, see [`RuleConfig`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct QAgentConfig<QC, MC, RC> {
    pub(crate) model: QModelConfig<QC>,
    pub(crate) memory: MC,
    #[serde(default)]
    pub(crate) exploration: Exploration,
    pub(crate) step_train: usize,
    pub(crate) batch_size: usize,
    pub(crate) gamma: f64,
    pub(crate) loss: CriticLoss,
    #[serde(default)]
    pub(crate) min_transitions_warmup: usize,
    #[serde(default = "default_seed")]
    pub(crate) seed: u64,
    #[serde(default)]
    pub(crate) device: Device,
    pub(crate) rule: RC,
}

impl<QC, MC, RC> Default for QAgentConfig<QC, MC, RC>
where
    MC: Default,
    RC: RuleConfig,
{
    fn default() -> Self {
        Self {
            model: QModelConfig::default().opt_config(RC::default_opt_config()),
            memory: MC::default(),
            exploration: Exploration::default(),
            step_train: 2,
            batch_size: 32,
            gamma: 0.99,
            loss: RC::default_loss(),
            min_transitions_warmup: 0,
            seed: default_seed(),
            device: Device::Cpu,
            rule: RC::default(),
        }
    }
}

impl<QC, MC, RC> QAgentConfig<QC, MC, RC>
where
    RC: RuleConfig,
{
    /// Sets the configuration of the model.
    pub fn model_config(mut self, v: QModelConfig<QC>) -> Self {
        self.model = v;
        self
    }

    /// Sets the configuration of the action-value function.
    ///
    /// Its input and output dimensions are overwritten from the spaces when the
    /// agent is built.
    pub fn q_config(mut self, v: QC) -> Self {
        self.model = self.model.q_config(v);
        self
    }

    /// Sets the optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.model = self.model.opt_config(v);
        self
    }

    /// Sets the configuration of the replay memory.
    pub fn memory_config(mut self, v: MC) -> Self {
        self.memory = v;
        self
    }

    /// Sets the exploration policy.
    pub fn exploration(mut self, v: impl Into<Exploration>) -> Self {
        self.exploration = v.into();
        self
    }

    /// Sets the number of learn calls between training steps.
    pub fn step_train(mut self, v: usize) -> Self {
        self.step_train = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the loss.
    pub fn loss(mut self, v: CriticLoss) -> Self {
        self.loss = v;
        self
    }

    /// Sets the number of transitions required in the memory before training.
    pub fn min_transitions_warmup(mut self, v: usize) -> Self {
        self.min_transitions_warmup = v;
        self
    }

    /// Sets the random seed of the agent.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Sets the algorithm-specific configuration.
    pub fn rule_config(mut self, v: RC) -> Self {
        self.rule = v;
        self
    }

    /// Returns the configuration of the model.
    pub fn get_model_config(&self) -> &QModelConfig<QC> {
        &self.model
    }

    /// Returns the configuration of the replay memory.
    pub fn get_memory_config(&self) -> &MC {
        &self.memory
    }

    /// Returns the exploration policy.
    pub fn get_exploration(&self) -> &Exploration {
        &self.exploration
    }

    /// Returns the number of learn calls between training steps.
    pub fn get_step_train(&self) -> usize {
        self.step_train
    }

    /// Returns the batch size.
    pub fn get_batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the discount factor.
    pub fn get_gamma(&self) -> f64 {
        self.gamma
    }

    /// Returns the loss.
    pub fn get_loss(&self) -> CriticLoss {
        self.loss
    }

    /// Returns the algorithm-specific configuration.
    pub fn get_rule_config(&self) -> &RC {
        &self.rule
    }

    /// Checks the hyperparameters.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(BellmanError::config(format!("gamma must be in [0, 1], got {}", self.gamma)).into());
        }
        if self.batch_size == 0 {
            return Err(BellmanError::config("batch_size must be positive").into());
        }
        if self.step_train == 0 {
            return Err(BellmanError::config("step_train must be positive").into());
        }
        self.exploration.validate()?;
        self.rule.validate()?;
        self.rule.check_loss(&self.loss)
    }
}

impl<QC, MC, RC> QAgentConfig<QC, MC, RC>
where
    QC: DeserializeOwned + Serialize,
    MC: DeserializeOwned + Serialize,
    RC: DeserializeOwned + Serialize,
{
    /// Constructs [`QAgentConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QAgentConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
