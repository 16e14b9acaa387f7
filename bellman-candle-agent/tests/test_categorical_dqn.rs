use anyhow::Result;
use bellman_candle_agent::{
    categorical_dqn::{CategoricalDqn, CategoricalDqnConfig},
    util::CriticLoss,
};
use bellman_core::{
    dummy::ChainEnv, error::BellmanError, util::run_episodes, Agent, Env, Space, Transition,
};

#[test]
fn test_action_values_within_support() -> Result<()> {
    let config = CategoricalDqnConfig::default().value_range(-5.0, 5.0).num_atoms(21);
    let agent: CategoricalDqn = CategoricalDqn::build(config, Space::boxed(&[4]), Space::discrete(3))?;

    let values = agent.action_values(&[0.3, 0.1, -0.7, 2.0])?;
    assert_eq!(values.len(), 3);
    assert!(values.iter().all(|v| (-5.0..=5.0).contains(v)));
    Ok(())
}

#[test]
fn test_rejects_value_losses() {
    for loss in [CriticLoss::Mse, CriticLoss::SmoothL1] {
        let config = CategoricalDqnConfig::default().loss(loss);
        let result: Result<CategoricalDqn> =
            CategoricalDqn::build(config, Space::boxed(&[4]), Space::discrete(3));
        assert!(matches!(
            result.err().unwrap().downcast_ref::<BellmanError>(),
            Some(BellmanError::Configuration(_))
        ));
    }
}

#[test]
fn test_learning_moves_distribution() -> Result<()> {
    let config = CategoricalDqnConfig::default()
        .value_range(-1.0, 1.0)
        .num_atoms(5)
        .gamma(0.0)
        .step_train(1)
        .batch_size(1);
    let mut agent: CategoricalDqn = CategoricalDqn::build(config, Space::boxed(&[2]), Space::discrete(2))?;
    let obs = vec![1.0, 0.0];
    let before = agent.action_values(&obs)?[1];

    // Action 1 is always rewarded with the upper bound of the support
    for _ in 0..50 {
        let tr = Transition::new(obs.clone(), 1, 1.0, vec![0.0, 1.0], true);
        let loss = agent.learn(tr)?.unwrap().get_scalar("loss")?;
        assert!(loss.is_finite());
    }
    let after = agent.action_values(&obs)?[1];
    assert!(after > before);
    Ok(())
}

#[test]
fn test_chain_env() -> Result<()> {
    let mut env = ChainEnv::new(3, 10);
    let config = CategoricalDqnConfig::default()
        .value_range(0.0, 1.0)
        .num_atoms(11)
        .step_train(1)
        .batch_size(4)
        .min_transitions_warmup(4);
    let mut agent: CategoricalDqn =
        CategoricalDqn::build(config, env.observation_space(), env.action_space())?;

    let returns = run_episodes(&mut env, &mut agent, 5, true)?;
    assert_eq!(returns.len(), 5);
    assert!(agent.n_opts() > 0);
    Ok(())
}
