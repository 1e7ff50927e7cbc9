//! # deepq - Deep Q-Network agent core
//!
//! deepq implements the agent side of Deep Q-Learning: an experience replay buffer, an
//! epsilon-greedy policy with legal-action masking, a periodically synchronised target
//! network and the temporal-difference training step that ties them together. Environments
//! are plugged in through a trait; the crate never simulates one itself.
//!
//! ## Key Features
//!
//! - **Replay**: fixed-capacity FIFO buffer with uniform sampling without replacement
//! - **Policy**: epsilon-greedy with geometric decay, stable argmax and action masking
//! - **Target network**: value snapshot of the online model, refreshed every `max_tau` steps
//! - **Approximator seam**: any model implementing [`approximator::QFunction`]; a small
//!   `ndarray` MLP with Adam is included
//! - **Episode loop**: [`runner::Trainer`] with turn-based opponents and guaranteed
//!   save-and-close on exit
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deepq::agent::DqnAgentBuilder;
//! use deepq::config::{AgentConfig, TrainerConfig};
//! use deepq::metrics::MetricsTracker;
//! use deepq::runner::Trainer;
//! # use deepq::environment::{Environment, Step};
//! # use deepq::error::Result;
//! # use ndarray::Array1;
//! # struct MyEnv;
//! # impl Environment for MyEnv {
//! #     fn observation_size(&self) -> usize { 8 }
//! #     fn action_count(&self) -> usize { 4 }
//! #     fn reset(&mut self) -> Result<Array1<f32>> { Ok(Array1::zeros(8)) }
//! #     fn step(&mut self, _action: usize) -> Result<Step> { Ok(Step::new(Array1::zeros(8), 0.0, true)) }
//! # }
//!
//! deepq::logging::init_logging();
//!
//! let mut env = MyEnv;
//! let mut agent = DqnAgentBuilder::new()
//!     .state_size(env.observation_size())
//!     .action_size(env.action_count())
//!     .config(AgentConfig::lunar_lander())
//!     .build()?;
//!
//! let mut trainer = Trainer::new(TrainerConfig::lunar_lander())?;
//! let mut metrics = MetricsTracker::default();
//! let report = trainer.run(&mut agent, &mut env, &mut metrics)?;
//! println!("played {} episodes", report.episodes);
//! # Ok::<(), deepq::error::DqnError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions (ReLU, Linear, Tanh, LeakyReLU)
//! - [`agent`] - The DQN agent and its builder
//! - [`approximator`] - The `QFunction` trait for action-value models
//! - [`config`] - Agent and trainer hyper-parameters with presets
//! - [`environment`] - Environment and opponent traits
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialisation
//! - [`logging`] - `env_logger` setup for binaries and tests
//! - [`loss`] - Loss functions for training
//! - [`metrics`] - Episode summaries and metric sinks
//! - [`network`] - Multi-layer perceptron implementation
//! - [`optimizer`] - Optimization algorithms
//! - [`policy`] - Epsilon-greedy action selection
//! - [`replay_buffer`] - Experience replay
//! - [`runner`] - The training episode loop
//! - [`target`] - Target network management

pub mod activations;
pub mod agent;
pub mod approximator;
pub mod config;
pub mod environment;
pub mod error;
pub mod layers;
pub mod logging;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod policy;
pub mod replay_buffer;
pub mod runner;
pub mod target;

#[cfg(test)]
mod tests;
