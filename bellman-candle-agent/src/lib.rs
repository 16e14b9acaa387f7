//! Value-based RL agents implemented with [candle](https://crates.io/crates/candle-core).
//!
//! All agents share [`agent::QAgent`], which owns the value function, the replay
//! memory and the exploration policy, and differ in their [`agent::UpdateRule`]:
//!
//! * [`dqn::Dqn`] bootstraps from the online network.
//! * [`double_dqn::DoubleDqn`] selects next actions with the online network and
//!   evaluates them with a periodically synchronized target network.
//! * [`categorical_dqn::CategoricalDqn`] learns a return distribution over a fixed
//!   support.
pub mod agent;
pub mod categorical_dqn;
pub mod double_dqn;
pub mod dqn;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod util;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    #[default]
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
