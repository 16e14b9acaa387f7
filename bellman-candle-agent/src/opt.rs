//! Optimizers.
//!
//! The optimizers own their per-parameter state as plain tensors, so the state
//! can be saved together with the weights and restored exactly.
use anyhow::{anyhow, Result};
use bellman_core::error::BellmanError;
use candle_core::{backprop::GradStore, DType, Device, Tensor, Var};
use candle_nn::VarMap;
use log::{info, trace};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, path::Path};

/// Configuration of optimizer for training the value function.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
        #[serde(default = "default_beta1")]
        /// Decay of the first moment.
        beta1: f64,
        #[serde(default = "default_beta2")]
        /// Decay of the second moment.
        beta2: f64,
        #[serde(default = "default_eps")]
        /// Term added to the denominator.
        eps: f64,
        #[serde(default)]
        /// L2 penalty.
        weight_decay: f64,
    },

    /// Stochastic gradient descent.
    Sgd {
        /// Learning rate.
        lr: f64,
        #[serde(default)]
        /// Momentum factor.
        momentum: f64,
    },

    /// RMSProp optimizer.
    RmsProp {
        /// Learning rate.
        lr: f64,
        #[serde(default = "default_alpha")]
        /// Smoothing constant.
        alpha: f64,
        #[serde(default = "default_eps")]
        /// Term added to the denominator.
        eps: f64,
    },
}

fn default_beta1() -> f64 {
    0.9
}

fn default_beta2() -> f64 {
    0.999
}

fn default_eps() -> f64 {
    1e-8
}

fn default_alpha() -> f64 {
    0.99
}

impl OptimizerConfig {
    /// Adam with the given learning rate and default moment decays.
    pub fn adam(lr: f64) -> Self {
        Self::Adam {
            lr,
            beta1: default_beta1(),
            beta2: default_beta2(),
            eps: default_eps(),
            weight_decay: 0.0,
        }
    }

    /// Constructs [`Optimizer`] for the variables of `varmap`.
    pub fn build(&self, varmap: &VarMap) -> Result<Optimizer> {
        self.validate()?;

        let data = varmap
            .data()
            .lock()
            .map_err(|_| anyhow!("variables of the model are poisoned"))?;
        let mut names = data.keys().cloned().collect::<Vec<_>>();
        names.sort();

        let params = names
            .into_iter()
            .map(|name| -> Result<ParamState> {
                let var = data[&name].clone();
                let m = var.as_tensor().zeros_like()?;
                let v = var.as_tensor().zeros_like()?;
                Ok(ParamState { name, var, m, v })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Optimizer {
            config: self.clone(),
            params,
            n_steps: 0,
        })
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::Adam {
                beta1,
                beta2,
                eps,
                weight_decay,
                ..
            } => Self::Adam {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Sgd { momentum, .. } => Self::Sgd { lr, momentum },
            Self::RmsProp { alpha, eps, .. } => Self::RmsProp { lr, alpha, eps },
        }
    }

    /// Returns the learning rate.
    pub fn get_learning_rate(&self) -> f64 {
        match self {
            Self::Adam { lr, .. } | Self::Sgd { lr, .. } | Self::RmsProp { lr, .. } => *lr,
        }
    }

    fn validate(&self) -> Result<()> {
        let ok = match self {
            Self::Adam {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => {
                *lr > 0.0
                    && (0.0..1.0).contains(beta1)
                    && (0.0..1.0).contains(beta2)
                    && *eps > 0.0
                    && *weight_decay >= 0.0
            }
            Self::Sgd { lr, momentum } => *lr > 0.0 && (0.0..1.0).contains(momentum),
            Self::RmsProp { lr, alpha, eps } => *lr > 0.0 && (0.0..1.0).contains(alpha) && *eps > 0.0,
        };

        match ok {
            true => Ok(()),
            false => Err(BellmanError::config(format!("invalid optimizer: {:?}", self)).into()),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::adam(1e-3)
    }
}

impl fmt::Display for OptimizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adam { lr, .. } => write!(f, "Adam(lr={})", lr),
            Self::Sgd { lr, momentum } => write!(f, "SGD(lr={}, momentum={})", lr, momentum),
            Self::RmsProp { lr, .. } => write!(f, "RMSprop(lr={})", lr),
        }
    }
}

struct ParamState {
    name: String,
    var: Var,
    // Adam: first moment. SGD: momentum buffer.
    m: Tensor,
    // Adam: second moment. RMSProp: running average of squared gradients.
    v: Tensor,
}

/// Optimizer updating the variables of a value function.
pub struct Optimizer {
    config: OptimizerConfig,
    params: Vec<ParamState>,
    n_steps: usize,
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        let grads = loss.backward()?;
        self.step(&grads)
    }

    /// Updates the variables with the given gradients.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        self.n_steps += 1;
        let t = self.n_steps as i32;

        for p in self.params.iter_mut() {
            let Some(g) = grads.get(p.var.as_tensor()) else {
                continue;
            };
            let theta = p.var.as_tensor();

            let delta = match &self.config {
                OptimizerConfig::Adam {
                    lr,
                    beta1,
                    beta2,
                    eps,
                    weight_decay,
                } => {
                    let g = match *weight_decay > 0.0 {
                        true => (g + (theta * *weight_decay)?)?,
                        false => g.clone(),
                    };
                    p.m = ((&p.m * *beta1)? + (&g * (1.0 - beta1))?)?.detach();
                    p.v = ((&p.v * *beta2)? + (g.sqr()? * (1.0 - beta2))?)?.detach();
                    let m_hat = (&p.m / (1.0 - beta1.powi(t)))?;
                    let v_hat = (&p.v / (1.0 - beta2.powi(t)))?;
                    ((m_hat / (v_hat.sqrt()? + *eps)?)? * *lr)?
                }
                OptimizerConfig::Sgd { lr, momentum } => match *momentum > 0.0 {
                    true => {
                        p.m = ((&p.m * *momentum)? + g)?.detach();
                        (&p.m * *lr)?
                    }
                    false => (g * *lr)?,
                },
                OptimizerConfig::RmsProp { lr, alpha, eps } => {
                    p.v = ((&p.v * *alpha)? + (g.sqr()? * (1.0 - alpha))?)?.detach();
                    ((g / (p.v.sqrt()? + *eps)?)? * *lr)?
                }
            };

            p.var.set(&(theta - delta)?.detach())?;
        }
        trace!("Optimizer step {}", self.n_steps);

        Ok(())
    }

    /// Number of optimization steps taken.
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Saves the internal state (moments and step counter) as safetensors.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let mut tensors = HashMap::new();
        for p in self.params.iter() {
            tensors.insert(format!("{}.m", p.name), p.m.clone());
            tensors.insert(format!("{}.v", p.name), p.v.clone());
        }
        tensors.insert(
            "n_steps".to_string(),
            Tensor::new(&[self.n_steps as u32], &Device::Cpu)?,
        );
        candle_core::safetensors::save(&tensors, path.as_ref())?;
        info!("Save optimizer state to {:?}", path.as_ref());
        Ok(())
    }

    /// Restores the internal state saved with [`Optimizer::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        let mut tensors = candle_core::safetensors::load(path.as_ref(), &Device::Cpu)?;
        let mut take = |key: String, like: &Tensor| -> Result<Tensor> {
            let t = tensors
                .remove(&key)
                .ok_or_else(|| BellmanError::config(format!("missing optimizer state {}", key)))?;
            if t.dims() != like.dims() {
                return Err(BellmanError::shape_mismatch(
                    format!("{:?} for {}", like.dims(), key),
                    format!("{:?}", t.dims()),
                )
                .into());
            }
            Ok(t.to_dtype(DType::F32)?.to_device(like.device())?)
        };

        for p in self.params.iter_mut() {
            p.m = take(format!("{}.m", p.name), &p.m)?;
            p.v = take(format!("{}.v", p.name), &p.v)?;
        }
        let n_steps = tensors
            .get("n_steps")
            .ok_or_else(|| BellmanError::config("missing optimizer step counter"))?;
        self.n_steps = n_steps.to_vec1::<u32>()?[0] as usize;
        info!("Load optimizer state from {:?}", path.as_ref());
        Ok(())
    }
}
