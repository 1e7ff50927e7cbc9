//! Epsilon-greedy action selection with geometric exploration decay and legal-action masking.

use ndarray::ArrayView1;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Serialize, Deserialize};

use crate::error::{DqnError, Result};

/// Index of the first maximum. NaN entries never win against a number.
pub fn argmax(values: ArrayView1<f32>) -> Option<usize> {
    best_of(values, 0..values.len())
}

/// Index of the first maximum among `legal`, in the order `legal` lists them.
pub fn masked_argmax(values: ArrayView1<f32>, legal: &[usize]) -> Option<usize> {
    best_of(values, legal.iter().copied().filter(|&i| i < values.len()))
}

fn best_of(values: ArrayView1<f32>, candidates: impl Iterator<Item = usize>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for i in candidates {
        let value = values[i];
        best = match best {
            None => Some((i, value)),
            Some((_, current)) if current.is_nan() && !value.is_nan() => Some((i, value)),
            Some((_, current)) if value > current => Some((i, value)),
            keep => keep,
        };
    }
    best.map(|(i, _)| i)
}

/// Exploration state of an epsilon-greedy policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    pub epsilon: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f32, epsilon_min: f32, epsilon_decay: f32) -> Self {
        EpsilonGreedy {
            epsilon,
            epsilon_min,
            epsilon_decay,
        }
    }

    /// Whether the next decision should explore.
    pub fn explore<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f32>() < self.epsilon
    }

    /// A uniformly random action from `legal`, or from `0..num_actions` when unmasked.
    pub fn random_action<R: Rng + ?Sized>(&self, num_actions: usize, legal: Option<&[usize]>, rng: &mut R) -> Result<usize> {
        match legal {
            Some(legal) => legal.choose(rng).copied().ok_or(DqnError::NoLegalActions),
            None if num_actions == 0 => Err(DqnError::NoLegalActions),
            None => Ok(rng.gen_range(0..num_actions)),
        }
    }

    /// The greedy action over `q_values`, restricted to `legal` when given.
    pub fn greedy_action(&self, q_values: ArrayView1<f32>, legal: Option<&[usize]>) -> Result<usize> {
        let choice = match legal {
            Some(legal) => masked_argmax(q_values, legal),
            None => argmax(q_values),
        };
        choice.ok_or(DqnError::NoLegalActions)
    }

    /// Full epsilon-greedy decision over precomputed action values.
    pub fn select<R: Rng + ?Sized>(&self, q_values: ArrayView1<f32>, legal: Option<&[usize]>, rng: &mut R) -> Result<usize> {
        if self.explore(rng) {
            self.random_action(q_values.len(), legal, rng)
        } else {
            self.greedy_action(q_values, legal)
        }
    }

    /// `epsilon := max(epsilon_min, epsilon * epsilon_decay)`
    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
    }

    /// Jump straight to the exploration floor, used once a trained model is loaded.
    pub fn force_min(&mut self) {
        self.epsilon = self.epsilon_min;
    }
}
