//! Agent shared by DQN, DoubleDQN and CategoricalDQN.
use super::{AgentSnapshot, QAgentConfig, RuleConfig, TensorBatch, UpdateRule, SNAPSHOT_VERSION};
use crate::{
    model::{QModel, SubModel1},
    util::{argmax_first, InOutDim},
};
use anyhow::{Context, Result};
use bellman_core::{
    error::BellmanError,
    record::{Record, RecordValue},
    Agent, GreedyExploration, ReplayMemory, Space, Transition,
};
use candle_core::Tensor;
use log::{debug, info, trace};
use rand::{rngs::SmallRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt::{self, Debug},
    fs,
    path::Path,
};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Value-based agent parameterized by its update rule.
///
/// * `Q` - action-value function.
/// * `M` - replay memory.
/// * `U` - update rule, which decides how action values are read from `Q` and
///   how the training loss is computed.
///
/// ```mermaid
/// graph LR
///     act -->|explore|RandomAction
///     act -->|greedy|UpdateRule::action_values
///     learn -->|append|ReplayMemory
///     learn -->|every step_train|train
///     train -->|sample|ReplayMemory
///     train -->|UpdateRule::loss|Optimizer
/// ```
pub struct QAgent<Q, M, U>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Default + InOutDim,
    M: ReplayMemory,
    U: UpdateRule<Q>,
{
    pub(crate) config: QAgentConfig<Q::Config, M::Config, U::Config>,
    pub(crate) observation_space: Space,
    pub(crate) action_space: Space,
    pub(crate) n_actions: usize,
    pub(crate) qnet: QModel<Q>,
    pub(crate) rule: U,
    pub(crate) memory: M,
    pub(crate) step: usize,
    pub(crate) explore: bool,
    pub(crate) device: candle_core::Device,
    rng: SmallRng,
}

impl<Q, M, U> QAgent<Q, M, U>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Default + InOutDim,
    M: ReplayMemory,
    U: UpdateRule<Q>,
{
    /// Constructs an agent for the given spaces.
    ///
    /// The input and output dimensions of the action-value function are derived
    /// from the spaces. If no network configuration is given, the default one is
    /// used. Fails with a configuration error if the action space is not discrete
    /// or a hyperparameter is invalid.
    pub fn build(
        config: QAgentConfig<Q::Config, M::Config, U::Config>,
        observation_space: Space,
        action_space: Space,
    ) -> Result<Self> {
        let n_actions = action_space.n()?;
        let obs_dim = observation_space.flat_dim();
        if obs_dim == 0 {
            return Err(BellmanError::config(format!(
                "observation space {} is empty",
                observation_space
            ))
            .into());
        }
        config.validate()?;

        let mut config = config;
        let mut q_config = config.model.q_config.clone().unwrap_or_default();
        q_config.set_in_dim(obs_dim);
        q_config.set_out_dim(config.rule.out_dim(n_actions));
        config.model = config.model.q_config(q_config);

        let device: candle_core::Device = config.device.try_into()?;
        let qnet = QModel::build(config.model.clone(), device.clone())?;
        let rule = U::build(&config.rule, &qnet)?;
        let memory = M::build(&config.memory)?;
        let rng = SmallRng::seed_from_u64(config.seed);

        info!(
            "Build {} agent, observation space = {}, action space = {}",
            U::Config::KIND,
            observation_space,
            action_space
        );

        Ok(Self {
            config,
            observation_space,
            action_space,
            n_actions,
            qnet,
            rule,
            memory,
            step: 0,
            explore: true,
            device,
            rng,
        })
    }

    /// Action values of the greedy policy for one observation.
    pub fn action_values(&self, obs: &[f32]) -> Result<Vec<f32>> {
        self.observation_space.check(obs)?;
        let obs = Tensor::from_slice(obs, (1, obs.len()), &self.device)?;
        let values = self.rule.action_values(&self.qnet, &obs)?;
        Ok(values.squeeze(0)?.to_vec1::<f32>()?)
    }

    fn greedy_action(&self, obs: &[f32]) -> Result<usize> {
        Ok(argmax_first(&self.action_values(obs)?))
    }

    /// Number of optimization steps taken.
    pub fn n_opts(&self) -> usize {
        self.qnet.n_opts()
    }

    /// Number of learn calls.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Returns `true` if exploration is enabled.
    pub fn is_exploring(&self) -> bool {
        self.explore
    }

    /// Returns the configuration.
    pub fn config(&self) -> &QAgentConfig<Q::Config, M::Config, U::Config> {
        &self.config
    }

    /// Observation space.
    pub fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    /// Action space.
    pub fn action_space(&self) -> &Space {
        &self.action_space
    }

    /// Online action-value function.
    pub fn qnet(&self) -> &QModel<Q> {
        &self.qnet
    }

    /// Update rule.
    pub fn rule(&self) -> &U {
        &self.rule
    }

    /// Replay memory.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Loads an agent and checks that it was saved for the given spaces.
    pub fn load_expecting(
        path: &Path,
        observation_space: &Space,
        action_space: &Space,
    ) -> Result<Self> {
        let agent = Self::load(path)?;
        if &agent.observation_space != observation_space || &agent.action_space != action_space {
            return Err(BellmanError::config(format!(
                "saved agent has spaces {} / {}, expected {} / {}",
                agent.observation_space, agent.action_space, observation_space, action_space
            ))
            .into());
        }
        Ok(agent)
    }
}

impl<Q, M, U> Agent for QAgent<Q, M, U>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Default + InOutDim,
    M: ReplayMemory,
    U: UpdateRule<Q>,
{
    fn act(&mut self, obs: &[f32]) -> Result<usize> {
        self.observation_space.check(obs)?;
        if self.explore && !self.config.exploration.be_greedy(self.step, &mut self.rng) {
            let act = self.action_space.sample(&mut self.rng)?;
            trace!("random action {} at step {}", act, self.step);
            return Ok(act);
        }
        self.greedy_action(obs)
    }

    fn learn(&mut self, transition: Transition) -> Result<Option<Record>> {
        transition.check(&self.observation_space, &self.action_space)?;
        self.memory.append(transition);
        self.step += 1;

        let record = match self.step % self.config.step_train == 0
            && self.memory.len() >= self.config.min_transitions_warmup
        {
            true => self.train().map(Some),
            false => Ok(None),
        };
        // Runs even if training failed, the step counter has already advanced
        self.rule.after_learn(self.step, &self.qnet)?;

        record
    }

    fn train(&mut self) -> Result<Record> {
        let batch = self.memory.sample(self.config.batch_size)?;
        let batch = TensorBatch::new(batch, self.n_actions, &self.device)?;
        let loss = self
            .rule
            .loss(&self.qnet, &batch, self.config.gamma, &self.config.loss)?;
        self.qnet.backward_step(&loss)?;

        let loss = loss.to_scalar::<f32>()?;
        let n_opts = self.qnet.n_opts();
        debug!("{}: n_opts = {}, loss = {}", U::Config::KIND, n_opts, loss);

        Ok(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss)),
            ("n_opts", RecordValue::Scalar(n_opts as f32)),
        ]))
    }

    fn enable_exploration(&mut self) {
        self.explore = true;
    }

    fn disable_exploration(&mut self) {
        self.explore = false;
    }

    fn save(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        let snapshot = AgentSnapshot {
            version: SNAPSHOT_VERSION,
            kind: U::Config::KIND.to_string(),
            observation_space: self.observation_space.clone(),
            action_space: self.action_space.clone(),
            step: self.step,
            explore: self.explore,
            config: self.config.clone(),
        };
        snapshot.save(path.join("agent.yaml"))?;
        self.qnet.save(path.join("qnet.safetensors"))?;
        self.qnet.save_opt(path.join("opt.safetensors"))?;
        self.rule.save(path)?;
        info!("Save {} agent to {:?}", U::Config::KIND, path);
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let snapshot =
            AgentSnapshot::<Q::Config, M::Config, U::Config>::load(path.join("agent.yaml"))?;
        let mut agent = Self::build(
            snapshot.config,
            snapshot.observation_space,
            snapshot.action_space,
        )
        .context("saved agent has an invalid configuration")?;

        agent.qnet.load(path.join("qnet.safetensors"))?;
        agent.qnet.load_opt(path.join("opt.safetensors"))?;
        agent.rule.load(path)?;
        agent.step = snapshot.step;
        agent.explore = snapshot.explore;
        info!("Load {} agent from {:?}", U::Config::KIND, path);
        Ok(agent)
    }
}

impl<Q, M, U> fmt::Display for QAgent<Q, M, U>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Default + InOutDim,
    M: ReplayMemory,
    U: UpdateRule<Q>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-Memory({}/{})-{}-{}-{}-{}-{}-{}-{}{}",
            U::Config::KIND,
            self.observation_space,
            self.action_space,
            self.memory.len(),
            self.memory.capacity(),
            self.config.step_train,
            self.step,
            self.config.batch_size,
            self.config.gamma,
            self.config.loss,
            self.config.model.opt_config,
            self.config.exploration,
            self.config.rule.describe(),
        )
    }
}
