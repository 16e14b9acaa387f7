use super::{QModel, SubModel1};
use anyhow::{Context, Result};
use candle_core::{DType, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use std::path::Path;

/// Frozen copy of a [`QModel`].
///
/// Holds the parameters and the network only. It is never optimized, its
/// parameters change only through [`TargetQModel::sync`] and
/// [`TargetQModel::load`].
pub struct TargetQModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
{
    varmap: VarMap,
    q: Q,
}

impl<Q> TargetQModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone,
{
    /// Builds a network with the configuration and the current parameters of
    /// `qnet`.
    pub fn from_online(qnet: &QModel<Q>) -> Result<Self> {
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, qnet.device());
            Q::build(vb, qnet.q_config().clone()).context("failed to build the target network")?
        };
        let target = Self { varmap, q };
        target.sync(qnet)?;
        Ok(target)
    }

    /// Outputs the action-values given a batch of observations, without gradient.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.q.forward(obs)?.detach())
    }

    /// Overwrites the parameters with those of `qnet`.
    pub fn sync(&self, qnet: &QModel<Q>) -> Result<()> {
        qnet.snapshot()?.copy_to(&self.varmap)
    }

    /// Number of parameter tensors.
    pub fn n_vars(&self) -> usize {
        self.varmap.all_vars().len()
    }

    /// Saves the parameters as safetensors.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save target network to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads parameters saved with [`TargetQModel::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap
            .load(&path)
            .with_context(|| format!("failed to load parameters from {:?}", path.as_ref()))?;
        info!("Load target network from {:?}", path.as_ref());
        Ok(())
    }
}
