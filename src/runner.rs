//! The episode loop that drives an agent through an environment.
//!
//! [`Trainer::run`] plays up to `max_episodes` episodes of at most `max_steps` steps each.
//! In turn-based environments only the moves of `learner_seat` are stored and trained on;
//! every other seat is played by the configured [`Opponent`]. Rewards are credited to every
//! seat a step reports them for, whoever moved. Whatever happens inside the
//! loop, the model is saved, the metrics sink is flushed and the environment is closed
//! before `run` returns.

use log::{error, info, warn};
use std::path::PathBuf;

use crate::agent::DqnAgent;
use crate::approximator::QFunction;
use crate::config::TrainerConfig;
use crate::environment::{Environment, Opponent};
use crate::error::{DqnError, Result};
use crate::metrics::{EpisodeSummary, MetricsSink, MetricsTracker};

/// Totals of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub episodes: usize,
    pub total_steps: usize,
    /// Training steps that returned an error and were skipped
    pub train_errors: usize,
    /// Where the model was written, if saving succeeded
    pub model_path: Option<PathBuf>,
}

pub struct Trainer {
    config: TrainerConfig,
    opponent: Option<Box<dyn Opponent>>,
    tracker: MetricsTracker,
    episodes: usize,
    train_errors: usize,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let tracker = MetricsTracker::new(config.average_window);
        Ok(Trainer {
            config,
            opponent: None,
            tracker,
            episodes: 0,
            train_errors: 0,
        })
    }

    /// Player for the seats the agent does not learn.
    pub fn with_opponent(mut self, opponent: Box<dyn Opponent>) -> Self {
        self.opponent = Some(opponent);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Rolling history of the episodes played so far
    pub fn tracker(&self) -> &MetricsTracker {
        &self.tracker
    }

    /// Train `agent` in `env`, reporting each episode to `sink`.
    ///
    /// Errors from the environment, the opponent or action selection end the run early and
    /// are returned after cleanup. Errors from a single training step are logged and counted.
    pub fn run<M, E, S>(&mut self, agent: &mut DqnAgent<M>, env: &mut E, sink: &mut S) -> Result<RunReport>
    where
        M: QFunction,
        E: Environment + ?Sized,
        S: MetricsSink + ?Sized,
    {
        self.episodes = 0;
        self.train_errors = 0;
        self.tracker.clear();

        let outcome = self.run_episodes(agent, env, sink);
        if let Err(err) = &outcome {
            error!("training aborted after {} episodes: {}", self.episodes, err);
        }

        let model_path = self.config.model_path();
        let saved = match agent.save_model(&model_path) {
            Ok(()) => {
                info!("saved model to {}", model_path.display());
                Some(model_path)
            }
            Err(err) => {
                error!("failed to save model to {}: {}", model_path.display(), err);
                None
            }
        };
        if let Err(err) = sink.flush() {
            error!("failed to flush metrics: {}", err);
        }
        if let Err(err) = env.close() {
            error!("failed to close environment: {}", err);
        }

        outcome.map(|()| RunReport {
            episodes: self.episodes,
            total_steps: self.tracker.total_steps(),
            train_errors: self.train_errors,
            model_path: saved,
        })
    }

    fn run_episodes<M, E, S>(&mut self, agent: &mut DqnAgent<M>, env: &mut E, sink: &mut S) -> Result<()>
    where
        M: QFunction,
        E: Environment + ?Sized,
        S: MetricsSink + ?Sized,
    {
        for episode in 0..self.config.max_episodes {
            let mut summary = self.play_episode(episode, agent, env)?;
            self.episodes += 1;
            self.tracker.record_episode(&summary);
            summary.reward_averages = (0..summary.rewards.len())
                .map(|seat| {
                    self.tracker
                        .avg_episode_reward(seat, self.config.average_window)
                        .unwrap_or(0.0)
                })
                .collect();

            let seat = self.config.learner_seat;
            info!(
                "episode {:4} | steps {:4} | reward {:+9.3} | avg reward {:+9.3} | loss {:.5} | epsilon {:.3}",
                summary.episode,
                summary.steps,
                summary.reward(seat),
                summary.reward_average(seat).unwrap_or(0.0),
                summary.loss,
                summary.epsilon
            );

            if let Err(err) = sink.record(&summary) {
                warn!("metrics sink rejected episode {}: {}", episode, err);
            }
        }
        Ok(())
    }

    fn play_episode<M, E>(&mut self, episode: usize, agent: &mut DqnAgent<M>, env: &mut E) -> Result<EpisodeSummary>
    where
        M: QFunction,
        E: Environment + ?Sized,
    {
        let learner = self.config.learner_seat;
        let mut rewards = vec![0.0; env.num_players().max(learner + 1)];
        let mut total_loss = 0.0;
        let mut steps = 0;

        let mut state = env.reset()?;
        for _ in 0..self.config.max_steps {
            let player = env.current_player();
            let legal = env.legal_actions(state.view());

            let outcome = if player == learner {
                let action = agent.select_action(state.view(), Some(legal.as_slice()))?;
                let outcome = env.step(action)?;
                agent.remember(state, action, outcome.reward(learner), outcome.observation.clone(), outcome.done)?;

                match agent.train_step() {
                    Ok(loss) => total_loss += loss,
                    Err(err) => {
                        self.train_errors += 1;
                        error!("training step failed in episode {}: {}", episode, err);
                    }
                }
                outcome
            } else {
                let opponent = self
                    .opponent
                    .as_mut()
                    .ok_or_else(|| DqnError::environment(format!("no opponent configured for player {}", player)))?;
                let action = opponent.choose_action(state.view(), &legal)?;
                env.step(action)?
            };

            if outcome.rewards.len() > rewards.len() {
                rewards.resize(outcome.rewards.len(), 0.0);
            }
            for (total, reward) in rewards.iter_mut().zip(&outcome.rewards) {
                *total += reward;
            }
            steps += 1;
            state = outcome.observation;

            if outcome.done {
                break;
            }
        }

        agent.end_episode();

        Ok(EpisodeSummary {
            episode,
            epsilon: agent.epsilon(),
            loss: total_loss,
            steps,
            rewards,
            reward_averages: Vec::new(),
        })
    }
}
