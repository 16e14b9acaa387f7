use crate::opt::OptimizerConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`QModel`](super::QModel).
pub struct QModelConfig<Q> {
    pub(crate) q_config: Option<Q>,
    #[serde(default)]
    pub(crate) opt_config: OptimizerConfig,
}

impl<Q> Default for QModelConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<Q> QModelConfig<Q> {
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Returns the configuration of the action-value function, if set.
    pub fn get_q_config(&self) -> Option<&Q> {
        self.q_config.as_ref()
    }

    /// Returns the optimizer configuration.
    pub fn get_opt_config(&self) -> &OptimizerConfig {
        &self.opt_config
    }
}

impl<Q> QModelConfig<Q>
where
    Q: Serialize + for<'de> Deserialize<'de>,
{
    /// Constructs [`QModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QModelConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mlp::MlpConfig;
    use tempdir::TempDir;

    #[test]
    fn test_missing_q_config() -> Result<()> {
        let config: QModelConfig<MlpConfig> =
            serde_yaml::from_str("opt_config:\n  Sgd:\n    lr: 0.5\n")?;
        assert_eq!(config.get_q_config(), None);
        assert_eq!(config.get_opt_config().get_learning_rate(), 0.5);

        let config: QModelConfig<MlpConfig> = serde_yaml::from_str("{}")?;
        assert_eq!(config, QModelConfig::default());
        Ok(())
    }

    #[test]
    fn test_serde_qmodel_config() -> Result<()> {
        let config = QModelConfig::default()
            .q_config(MlpConfig::new(4, vec![16, 16], 2, false))
            .opt_config(OptimizerConfig::adam(0.01));

        let dir = TempDir::new("qmodel_config")?;
        let path = dir.path().join("qmodel_config.yaml");
        config.save(&path)?;
        let config_ = QModelConfig::<MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
