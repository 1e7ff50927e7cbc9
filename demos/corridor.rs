//! Train a DQN agent to walk to the end of a corridor.
//!
//! Run with `cargo run --example corridor`. Set `RUST_LOG=debug` for per-step details.

use deepq::agent::DqnAgentBuilder;
use deepq::config::{AgentConfig, TrainerConfig};
use deepq::environment::{Environment, Step};
use deepq::error::Result;
use deepq::metrics::CsvMetricsWriter;
use deepq::runner::Trainer;
use ndarray::Array1;

/// One-hot position on a line; moving right off the last cell ends the episode.
struct Corridor {
    length: usize,
    position: usize,
}

impl Corridor {
    fn observation(&self) -> Array1<f32> {
        let mut obs = Array1::zeros(self.length);
        obs[self.position] = 1.0;
        obs
    }
}

impl Environment for Corridor {
    fn observation_size(&self) -> usize {
        self.length
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.position = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        match action {
            1 => self.position = (self.position + 1).min(self.length - 1),
            _ => self.position = self.position.saturating_sub(1),
        }
        let done = self.position == self.length - 1;
        let reward = if done { 10.0 } else { -1.0 };
        Ok(Step::new(self.observation(), reward, done))
    }
}

fn main() -> Result<()> {
    deepq::logging::init_logging();

    let mut env = Corridor { length: 8, position: 0 };

    let agent_config = AgentConfig {
        epsilon_decay: 0.9,
        hidden_layers: vec![16],
        ..AgentConfig::lunar_lander()
    };
    let trainer_config = TrainerConfig {
        max_episodes: 60,
        max_steps: 100,
        model_dir: "data/saved_models".into(),
        ..TrainerConfig::default()
    };

    let mut agent = DqnAgentBuilder::new()
        .state_size(env.observation_size())
        .action_size(env.action_count())
        .config(agent_config)
        .load_weights(trainer_config.model_path())
        .build()?;

    let mut sink = CsvMetricsWriter::new("data/logs", &trainer_config.run_id)?;
    let mut trainer = Trainer::new(trainer_config)?;
    let report = trainer.run(&mut agent, &mut env, &mut sink)?;

    println!(
        "{} episodes, {} steps, average reward over the last 10: {:+.2}",
        report.episodes,
        report.total_steps,
        trainer.tracker().avg_episode_reward(0, 10).unwrap_or(0.0)
    );
    Ok(())
}
