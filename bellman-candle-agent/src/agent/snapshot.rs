//! Persisted state of an agent.
use super::{QAgentConfig, RuleConfig};
use anyhow::{Context, Result};
use bellman_core::{error::BellmanError, Space};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Version of the layout of `agent.yaml`.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Content of `agent.yaml` in the directory of a saved agent.
///
/// Weights are stored next to it: `qnet.safetensors`, `opt.safetensors` for the
/// optimizer state, and `qnet_tgt.safetensors` for agents with a target network.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct AgentSnapshot<QC, MC, RC> {
    /// Version of the layout.
    pub version: u32,

    /// Algorithm, e.g. `DQN`.
    pub kind: String,

    /// Observation space.
    pub observation_space: Space,

    /// Action space.
    pub action_space: Space,

    /// Number of learn calls.
    pub step: usize,

    /// Whether exploration is enabled.
    pub explore: bool,

    /// Configuration, including hyperparameters and network dimensions.
    pub config: QAgentConfig<QC, MC, RC>,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
    kind: String,
}

impl<QC, MC, RC> AgentSnapshot<QC, MC, RC>
where
    QC: Serialize + for<'de> Deserialize<'de>,
    MC: Serialize + for<'de> Deserialize<'de>,
    RC: RuleConfig,
{
    /// Writes the snapshot as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    /// Reads a snapshot written by an agent of kind `RC::KIND`.
    ///
    /// Fails with a configuration error for unknown versions and other kinds of
    /// agents.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let header: Header = {
            let rdr = BufReader::new(File::open(path)?);
            serde_yaml::from_reader(rdr).with_context(|| format!("invalid agent file {:?}", path))?
        };

        if header.version != SNAPSHOT_VERSION {
            return Err(BellmanError::config(format!(
                "unsupported agent file version {}, expected {}",
                header.version, SNAPSHOT_VERSION
            ))
            .into());
        }
        if header.kind != RC::KIND {
            return Err(BellmanError::config(format!(
                "agent file contains a {} agent, expected {}",
                header.kind,
                RC::KIND
            ))
            .into());
        }

        let rdr = BufReader::new(File::open(path)?);
        let snapshot = serde_yaml::from_reader(rdr).with_context(|| format!("invalid agent file {:?}", path))?;
        Ok(snapshot)
    }
}
