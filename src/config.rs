//! Hyper-parameters for the agent and the episode loop.
//!
//! Both structs deserialize from JSON with every field optional, so a config file only
//! needs to name what differs from the defaults.

use serde::{Serialize, Deserialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{DqnError, Result};
use crate::layers::WeightInit;
use crate::replay_buffer::DEFAULT_CAPACITY;

/// When the exploration rate decays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecaySchedule {
    /// After every training step that updated the model
    #[default]
    PerTrainStep,
    /// Once at the end of every episode
    PerEpisode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub epsilon: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
    pub decay_schedule: DecaySchedule,
    pub gamma: f32,
    pub learning_rate: f32,
    /// Training steps between target syncs
    pub max_tau: usize,
    pub batch_size: usize,
    pub buffer_capacity: usize,
    pub hidden_layers: Vec<usize>,
    /// Distribution of the fresh network's weights
    pub weight_init: WeightInit,
    /// Fixed seed for exploration, sampling and weight init
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::tictactoe()
    }
}

impl AgentConfig {
    /// Settings of the Tic-Tac-Toe learner (player 0 against a random opponent).
    pub fn tictactoe() -> Self {
        AgentConfig {
            epsilon: 1.0,
            epsilon_min: 0.001,
            epsilon_decay: 0.9975,
            decay_schedule: DecaySchedule::PerTrainStep,
            gamma: 0.99,
            learning_rate: 0.0001,
            max_tau: 1000,
            batch_size: 64,
            buffer_capacity: DEFAULT_CAPACITY,
            hidden_layers: vec![32],
            weight_init: WeightInit::XavierUniform,
            seed: None,
        }
    }

    /// Settings of the Lunar Lander learner.
    pub fn lunar_lander() -> Self {
        AgentConfig {
            epsilon: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.98,
            decay_schedule: DecaySchedule::PerEpisode,
            gamma: 0.9995,
            learning_rate: 0.001,
            max_tau: 1000,
            batch_size: 16,
            buffer_capacity: DEFAULT_CAPACITY,
            hidden_layers: vec![24, 24],
            weight_init: WeightInit::XavierUniform,
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f32, allow_zero: bool| -> Result<()> {
            let low_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
            if low_ok && value <= 1.0 {
                Ok(())
            } else {
                Err(DqnError::invalid_parameter(name.to_string(), format!("{} is outside the unit interval", value)))
            }
        };

        unit("epsilon", self.epsilon, true)?;
        unit("epsilon_min", self.epsilon_min, true)?;
        unit("epsilon_decay", self.epsilon_decay, false)?;
        unit("gamma", self.gamma, false)?;

        if self.epsilon_min > self.epsilon {
            return Err(DqnError::invalid_parameter("epsilon_min", "must not exceed epsilon"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(DqnError::invalid_parameter("learning_rate", "must be a positive number"));
        }
        if self.batch_size == 0 {
            return Err(DqnError::invalid_parameter("batch_size", "must be greater than 0"));
        }
        if self.buffer_capacity == 0 {
            return Err(DqnError::invalid_parameter("buffer_capacity", "must be greater than 0"));
        }
        if self.hidden_layers.iter().any(|&units| units == 0) {
            return Err(DqnError::invalid_parameter("hidden_layers", "every hidden layer needs at least one unit"));
        }
        if let WeightInit::Uniform { min, max } = self.weight_init {
            if !(min.is_finite() && max.is_finite() && min <= max) {
                return Err(DqnError::invalid_parameter("weight_init", "uniform range needs finite bounds with min <= max"));
            }
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Run identifier derived from the wall clock, in seconds since the UNIX epoch.
pub fn default_run_id() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("run-{}", seconds)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub max_episodes: usize,
    pub max_steps: usize,
    /// Seat trained by the agent in turn-based environments
    pub learner_seat: usize,
    /// Rolling window for average episode rewards
    pub average_window: usize,
    /// Saved models go to `<model_dir>/model_<run_id>.bin`
    pub model_dir: PathBuf,
    pub run_id: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            max_episodes: 20,
            max_steps: 100,
            learner_seat: 0,
            average_window: 100,
            model_dir: PathBuf::from("data").join("saved_models"),
            run_id: default_run_id(),
        }
    }
}

impl TrainerConfig {
    pub fn tictactoe() -> Self {
        Self::default()
    }

    pub fn lunar_lander() -> Self {
        TrainerConfig {
            max_episodes: 10_000,
            max_steps: 1000,
            ..Self::default()
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(format!("model_{}.bin", self.run_id))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(DqnError::invalid_parameter("max_steps", "must be greater than 0"));
        }
        if self.average_window == 0 {
            return Err(DqnError::invalid_parameter("average_window", "must be greater than 0"));
        }
        if self.run_id.is_empty() {
            return Err(DqnError::invalid_parameter("run_id", "must not be empty"));
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }
}
