//! Collaborator traits for the world the agent acts in.
//!
//! The crate does not simulate any environment. Callers wrap their own simulator (a board
//! game, a physics sandbox, a Gym bridge) behind [`Environment`] and hand it to the
//! [`Trainer`](crate::runner::Trainer).

use ndarray::{Array1, ArrayView1};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{DqnError, Result};

/// Outcome of one environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub observation: Array1<f32>,
    /// Reward earned by each seat on this step, indexed by seat
    pub rewards: Vec<f32>,
    pub done: bool,
}

impl Step {
    /// Outcome of a single-player environment; `reward` goes to seat 0.
    pub fn new(observation: Array1<f32>, reward: f32, done: bool) -> Self {
        Self::per_player(observation, vec![reward], done)
    }

    /// Outcome of a multi-player environment with one reward per seat.
    pub fn per_player(observation: Array1<f32>, rewards: Vec<f32>, done: bool) -> Self {
        Step {
            observation,
            rewards,
            done,
        }
    }

    /// Reward of `seat`, or 0 when the step reports none for it.
    pub fn reward(&self, seat: usize) -> f32 {
        self.rewards.get(seat).copied().unwrap_or(0.0)
    }
}

/// An episodic environment with a discrete action space.
///
/// Turn-based games report whose move it is through [`Environment::current_player`] and
/// build their steps with [`Step::per_player`], so a winning move can penalise the seats
/// that did not make it.
pub trait Environment {
    /// Length of every observation vector
    fn observation_size(&self) -> usize;

    /// Number of discrete actions
    fn action_count(&self) -> usize;

    /// Start a new episode and return the first observation.
    fn reset(&mut self) -> Result<Array1<f32>>;

    /// Apply `action` for the current player.
    fn step(&mut self, action: usize) -> Result<Step>;

    /// Actions allowed in `state`. Everything is legal unless overridden.
    fn legal_actions(&self, _state: ArrayView1<f32>) -> Vec<usize> {
        (0..self.action_count()).collect()
    }

    /// Seat whose move it is.
    fn current_player(&self) -> usize {
        0
    }

    /// Number of seats taking turns
    fn num_players(&self) -> usize {
        1
    }

    /// Release whatever the environment holds. Called once at the end of a run.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Plays the seats the agent does not learn for.
pub trait Opponent {
    fn choose_action(&mut self, state: ArrayView1<f32>, legal: &[usize]) -> Result<usize>;
}

/// Picks a uniformly random legal move.
pub struct RandomOpponent {
    rng: StdRng,
}

impl RandomOpponent {
    pub fn new() -> Self {
        RandomOpponent {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        RandomOpponent {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomOpponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Opponent for RandomOpponent {
    fn choose_action(&mut self, _state: ArrayView1<f32>, legal: &[usize]) -> Result<usize> {
        legal.choose(&mut self.rng).copied().ok_or(DqnError::NoLegalActions)
    }
}
