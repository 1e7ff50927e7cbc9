//! # Deep Q-Network Agent
//!
//! [`DqnAgent`] ties together the pieces of a DQN learner:
//!
//! - an online [`QFunction`](crate::approximator::QFunction) that picks actions and is trained
//! - a [`TargetNetwork`](crate::target::TargetNetwork) snapshot that provides bootstrap values
//! - a [`ReplayBuffer`](crate::replay_buffer::ReplayBuffer) of past transitions
//! - an [`EpsilonGreedy`](crate::policy::EpsilonGreedy) exploration policy
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use deepq::agent::DqnAgentBuilder;
//! use deepq::config::AgentConfig;
//! use ndarray::array;
//!
//! let mut agent = DqnAgentBuilder::new()
//!     .state_size(4)
//!     .action_size(2)
//!     .config(AgentConfig::lunar_lander())
//!     .build()
//!     .unwrap();
//!
//! let state = array![0.1, 0.2, -0.3, 0.4];
//! let action = agent.select_action(state.view(), None).unwrap();
//! agent.remember(state.clone(), action, 1.0, array![0.1, 0.25, -0.3, 0.35], false).unwrap();
//! let loss = agent.train_step().unwrap();
//! ```

mod dqn;

pub use dqn::{DqnAgent, DqnAgentBuilder};
