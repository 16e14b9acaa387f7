use anyhow::Result;
use bellman_candle_agent::{
    dqn::{Dqn, DqnConfig},
    mlp::MlpConfig,
    opt::OptimizerConfig,
    util::CriticLoss,
};
use bellman_core::{
    dummy::ChainEnv, error::BellmanError, util::run_episodes, AdaptiveEpsilonGreedy, Agent,
    EpsilonGreedy, Env, ExperienceReplayConfig, ReplayMemory, Space, Transition,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn transition(i: usize) -> Transition {
    let x = i as f32 / 10.0;
    Transition::new(vec![x, 1.0 - x], i % 2, x, vec![1.0 - x, x], i % 4 == 3)
}

#[test]
fn test_train_single_step() -> Result<()> {
    init();
    let config = DqnConfig::default()
        .gamma(0.99)
        .batch_size(4)
        .step_train(100)
        .memory_config(ExperienceReplayConfig::default().capacity(50));
    let mut agent: Dqn = Dqn::build(config, Space::boxed(&[2]), Space::discrete(2))?;

    for i in 0..10 {
        assert!(agent.learn(transition(i))?.is_none());
    }
    assert_eq!(agent.memory().len(), 10);
    assert_eq!(agent.n_opts(), 0);

    let record = agent.train()?;
    let loss = record.get_scalar("loss")?;
    assert!(loss.is_finite() && loss >= 0.0);
    assert_eq!(record.get_scalar("n_opts")?, 1.0);
    assert_eq!(agent.n_opts(), 1);
    Ok(())
}

#[test]
fn test_insufficient_data() -> Result<()> {
    let config = DqnConfig::default().step_train(1).batch_size(8);
    let mut agent: Dqn = Dqn::build(config, Space::boxed(&[2]), Space::discrete(2))?;

    let err = agent.learn(transition(0)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BellmanError>(),
        Some(BellmanError::InsufficientData {
            requested: 8,
            available: 1
        })
    ));
    Ok(())
}

#[test]
fn test_warmup_delays_training() -> Result<()> {
    let config = DqnConfig::default()
        .step_train(1)
        .batch_size(4)
        .min_transitions_warmup(6);
    let mut agent: Dqn = Dqn::build(config, Space::boxed(&[2]), Space::discrete(2))?;

    for i in 0..5 {
        assert!(agent.learn(transition(i))?.is_none());
    }
    assert!(agent.learn(transition(5))?.is_some());
    assert!(agent.learn(transition(6))?.is_some());
    assert_eq!(agent.n_opts(), 2);
    assert_eq!(agent.step(), 7);
    Ok(())
}

#[test]
fn test_step_train() -> Result<()> {
    let config = DqnConfig::default().step_train(3).batch_size(1);
    let mut agent: Dqn = Dqn::build(config, Space::boxed(&[2]), Space::discrete(2))?;

    let trained = (0..9)
        .map(|i| agent.learn(transition(i)).map(|r| r.is_some()))
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(
        trained,
        vec![false, false, true, false, false, true, false, false, true]
    );
    Ok(())
}

#[test]
fn test_greedy_without_exploration() -> Result<()> {
    let config = DqnConfig::default().exploration(EpsilonGreedy::new(1.0)?);
    let mut agent: Dqn = Dqn::build(config, Space::boxed(&[3]), Space::discrete(4))?;
    agent.disable_exploration();
    assert!(!agent.is_exploring());

    for obs in [[0.1, 0.2, 0.3], [-1.0, 0.5, 2.0], [0.0, 0.0, 0.0]] {
        let values = agent.action_values(&obs)?;
        let best = values
            .iter()
            .enumerate()
            .fold(0, |b, (i, v)| if *v > values[b] { i } else { b });
        for _ in 0..5 {
            assert_eq!(agent.act(&obs)?, best);
        }
    }
    Ok(())
}

#[test]
fn test_full_exploration_covers_actions() -> Result<()> {
    let config = DqnConfig::default().exploration(EpsilonGreedy::new(1.0)?);
    let mut agent: Dqn = Dqn::build(config, Space::boxed(&[3]), Space::discrete(4))?;
    let obs = [0.1, 0.2, 0.3];

    let mut seen = [false; 4];
    for _ in 0..200 {
        seen[agent.act(&obs)?] = true;
    }
    assert!(seen.iter().all(|s| *s));
    Ok(())
}

#[test]
fn test_invalid_inputs() -> Result<()> {
    let mut agent: Dqn = Dqn::build(DqnConfig::default(), Space::boxed(&[3]), Space::discrete(2))?;
    assert!(agent.act(&[0.0, 1.0]).is_err());
    assert!(agent
        .learn(Transition::new(vec![0.0; 3], 2, 0.0, vec![0.0; 3], false))
        .is_err());
    assert_eq!(agent.step(), 0);

    let result: Result<Dqn> = Dqn::build(DqnConfig::default(), Space::boxed(&[3]), Space::boxed(&[2]));
    assert!(result.is_err());

    for config in [
        DqnConfig::default().gamma(1.5),
        DqnConfig::default().batch_size(0),
        DqnConfig::default().step_train(0),
    ] {
        let result: Result<Dqn> = Dqn::build(config, Space::boxed(&[3]), Space::discrete(2));
        assert!(matches!(
            result.err().unwrap().downcast_ref::<BellmanError>(),
            Some(BellmanError::Configuration(_))
        ));
    }
    Ok(())
}

#[test]
fn test_chain_env() -> Result<()> {
    init();
    let mut env = ChainEnv::new(4, 20);
    let config = DqnConfig::default()
        .q_config(MlpConfig::default().units(vec![16]))
        .opt_config(OptimizerConfig::adam(0.01))
        .loss(CriticLoss::SmoothL1)
        .exploration(AdaptiveEpsilonGreedy::new(1.0, 0.05, 100, 0)?)
        .step_train(1)
        .batch_size(8)
        .min_transitions_warmup(8);
    let mut agent: Dqn = Dqn::build(config, env.observation_space(), env.action_space())?;

    let returns = run_episodes(&mut env, &mut agent, 10, true)?;
    assert_eq!(returns.len(), 10);
    assert!(returns.iter().all(|r| *r == 0.0 || *r == 1.0));
    assert!(agent.n_opts() > 0);
    assert_eq!(agent.memory().len(), agent.step());

    agent.disable_exploration();
    let n_opts = agent.n_opts();
    run_episodes(&mut env, &mut agent, 2, false)?;
    assert_eq!(agent.n_opts(), n_opts);
    Ok(())
}
