//! The function-approximator seam between the DQN machinery and the model that estimates
//! action values.
//!
//! [`DqnAgent`](crate::agent::DqnAgent) only ever talks to its models through [`QFunction`], so
//! any differentiable model can stand in for the bundled [`NeuralNetwork`]. Tests use small
//! table-driven stubs through the same trait.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::path::Path;

use crate::error::Result;
use crate::network::NeuralNetwork;

/// A trainable estimator of action values.
pub trait QFunction: Clone {
    /// Number of features expected per state
    fn input_size(&self) -> usize;

    /// Width of the action-value vector returned per state
    fn num_actions(&self) -> usize;

    /// Action values for each row of `states`. Must not change the model.
    fn predict(&self, states: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Action values for a single state.
    fn predict_one(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        let values = self.predict(state.insert_axis(Axis(0)))?;
        Ok(values.index_axis_move(Axis(0), 0))
    }

    /// One gradient step toward `targets` using the whole batch as a single optimisation
    /// batch, for one epoch. Returns the reported loss.
    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32>;

    /// An independent copy of every parameter. Later `fit` calls on `self` must not be
    /// observable through the snapshot.
    fn snapshot(&self) -> Self {
        self.clone()
    }

    fn save(&self, path: &Path) -> Result<()>;

    fn load(path: &Path) -> Result<Self>
    where
        Self: Sized;
}

impl QFunction for NeuralNetwork {
    fn input_size(&self) -> usize {
        NeuralNetwork::input_size(self)
    }

    fn num_actions(&self) -> usize {
        self.output_size()
    }

    fn predict(&self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        NeuralNetwork::predict(self, states)
    }

    fn predict_one(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        NeuralNetwork::predict_one(self, state)
    }

    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        let learning_rate = self.learning_rate;
        self.train_minibatch(states, targets, learning_rate)
    }

    fn save(&self, path: &Path) -> Result<()> {
        NeuralNetwork::save(self, path)
    }

    fn load(path: &Path) -> Result<Self> {
        NeuralNetwork::load(path)
    }
}
