use super::{QModelConfig, SubModel1};
use crate::{
    opt::{Optimizer, OptimizerConfig},
    util::NamedTensors,
};
use anyhow::{Context, Result};
use bellman_core::error::BellmanError;
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use std::path::Path;

/// Action-value function together with its parameters and optimizer.
///
/// The network `Q` is built on a [`VarMap`] owned by this struct. Parameters can
/// be copied out with [`QModel::snapshot`] and written back with
/// [`QModel::load_snapshot`], which is how target networks are synchronized.
pub struct QModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
{
    device: Device,
    varmap: VarMap,

    // Action-value function
    q: Q,
    q_config: Q::Config,

    // Optimizer
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<Q> QModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone,
{
    /// Constructs [`QModel`] with freshly initialized parameters.
    pub fn build(config: QModelConfig<Q::Config>, device: Device) -> Result<Self> {
        let q_config = config
            .q_config
            .ok_or_else(|| BellmanError::config("q_config is not set"))?;
        let opt_config = config.opt_config;
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Q::build(vb, q_config.clone()).context("failed to build the action-value function")?
        };
        let opt = opt_config.build(&varmap)?;

        Ok(Self {
            device,
            varmap,
            q,
            q_config,
            opt_config,
            opt,
        })
    }

    /// Outputs the action-values given a batch of observations.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        self.q.forward(obs)
    }

    /// Trains the network given a loss.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Trainable parameters.
    pub fn parameters(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    /// Copies the current parameters.
    pub fn snapshot(&self) -> Result<NamedTensors> {
        NamedTensors::copy_from(&self.varmap)
    }

    /// Overwrites the parameters with a snapshot of a network of the same
    /// configuration.
    pub fn load_snapshot(&self, snapshot: &NamedTensors) -> Result<()> {
        snapshot.copy_to(&self.varmap)
    }

    /// Number of optimization steps taken.
    pub fn n_opts(&self) -> usize {
        self.opt.n_steps()
    }

    /// Returns the configuration of the network.
    pub fn q_config(&self) -> &Q::Config {
        &self.q_config
    }

    /// Returns the optimizer configuration.
    pub fn opt_config(&self) -> &OptimizerConfig {
        &self.opt_config
    }

    /// Device on which the parameters live.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Saves the parameters as safetensors.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save qmodel to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads parameters saved with [`QModel::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap
            .load(&path)
            .with_context(|| format!("failed to load parameters from {:?}", path.as_ref()))?;
        info!("Load qmodel from {:?}", path.as_ref());
        Ok(())
    }

    /// Saves the optimizer state.
    pub fn save_opt<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.opt.save(path)
    }

    /// Loads the optimizer state saved with [`QModel::save_opt`].
    pub fn load_opt<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.opt.load(path)
    }
}
