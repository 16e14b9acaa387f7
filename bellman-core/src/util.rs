//! Utilities for interaction of agents and environments.
use crate::{Agent, Env, Transition};
use anyhow::Result;
use log::{debug, info};

/// Runs episodes of `env` with `agent` and returns the undiscounted return of each
/// episode.
///
/// If `learn` is `true`, every transition is passed to [`Agent::learn`];
/// otherwise the agent only acts. [`Agent::episode_finished`] is called at the end
/// of each episode in both cases. Episodes end when the environment reports
/// `done`.
pub fn run_episodes<E, A>(env: &mut E, agent: &mut A, n_episodes: usize, learn: bool) -> Result<Vec<f32>>
where
    E: Env,
    A: Agent,
{
    let mut returns = Vec::with_capacity(n_episodes);

    for ix in 0..n_episodes {
        let mut obs = env.reset()?;
        let mut ret = 0f32;
        let mut n_steps = 0usize;

        loop {
            let act = agent.act(&obs)?;
            let step = env.step(act)?;
            ret += step.reward;
            n_steps += 1;

            if learn {
                let tr = Transition::new(obs, act, step.reward, step.obs.clone(), step.done);
                if let Some(record) = agent.learn(tr)? {
                    if let Ok(loss) = record.get_scalar("loss") {
                        debug!("episode = {}, step = {}, loss = {}", ix, n_steps, loss);
                    }
                }
            }

            obs = step.obs;
            if step.done {
                break;
            }
        }

        agent.episode_finished()?;
        info!("episode = {}, steps = {}, return = {}", ix, n_steps, ret);
        returns.push(ret);
    }

    Ok(returns)
}
