use anyhow::Result;
use bellman_candle_agent::double_dqn::{DoubleDqn, DoubleDqnConfig};
use bellman_core::{
    dummy::ChainEnv, util::run_episodes, Agent, Env, ExperienceReplayConfig, Space, Transition,
};

fn transition(i: usize) -> Transition {
    let x = (i % 5) as f32 / 5.0;
    Transition::new(vec![x, -x, 1.0], i % 3, 1.0 - x, vec![-x, x, 0.0], i % 5 == 4)
}

#[test]
fn test_target_copy_then_diverge() -> Result<()> {
    let config = DoubleDqnConfig::default()
        .step_train(1)
        .batch_size(2)
        .min_transitions_warmup(2)
        .step_copy(1000)
        .memory_config(ExperienceReplayConfig::default().capacity(20));
    let mut agent: DoubleDqn = DoubleDqn::build(config, Space::boxed(&[3]), Space::discrete(3))?;
    let probe = [0.2, -0.2, 1.0];

    assert!(agent.learn(transition(0))?.is_none());
    assert!(agent.learn(transition(1))?.is_some());
    assert_ne!(agent.action_values(&probe)?, agent.target_action_values(&probe)?);

    agent.copy_online_to_target()?;
    assert_eq!(agent.action_values(&probe)?, agent.target_action_values(&probe)?);

    let target = agent.target_action_values(&probe)?;
    agent.learn(transition(2))?;
    assert_ne!(agent.action_values(&probe)?, target);
    assert_eq!(agent.target_action_values(&probe)?, target);
    Ok(())
}

#[test]
fn test_target_frozen_between_copies() -> Result<()> {
    let config = DoubleDqnConfig::default()
        .step_train(1)
        .batch_size(1)
        .step_copy(4);
    let mut agent: DoubleDqn = DoubleDqn::build(config, Space::boxed(&[3]), Space::discrete(3))?;
    let probe = [0.0, 0.5, 1.0];
    let initial = agent.target_action_values(&probe)?;

    for i in 0..3 {
        agent.learn(transition(i))?;
        assert_eq!(agent.target_action_values(&probe)?, initial);
    }
    agent.learn(transition(3))?;
    assert_eq!(
        agent.target_action_values(&probe)?,
        agent.action_values(&probe)?
    );
    assert_ne!(agent.target_action_values(&probe)?, initial);
    Ok(())
}

#[test]
fn test_chain_env() -> Result<()> {
    let mut env = ChainEnv::new(3, 10);
    let config = DoubleDqnConfig::default()
        .step_train(1)
        .batch_size(4)
        .min_transitions_warmup(4)
        .step_copy(10);
    let mut agent: DoubleDqn = DoubleDqn::build(config, env.observation_space(), env.action_space())?;

    let returns = run_episodes(&mut env, &mut agent, 5, true)?;
    assert_eq!(returns.len(), 5);
    assert!(agent.n_opts() > 0);
    Ok(())
}
