use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::{DenseLayer, WeightInit};
use crate::loss::{Loss, LossWrapper};
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// A feed-forward network of dense layers with its optimizer, loss and learning rate.
///
/// This is the Q-value approximator used by [`DqnAgent`](crate::agent::DqnAgent): a state
/// vector goes in, one estimated return per action comes out.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
    pub loss: LossWrapper,
    pub learning_rate: f32,
}

impl NeuralNetwork {
    /// Create a new neural network with the given layer sizes and activations.
    ///
    /// `layer_sizes` includes the input and output sizes, so `activations` must hold exactly
    /// one entry per weight layer.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        optimizer: OptimizerWrapper,
        rng: &mut R,
    ) -> Result<Self> {
        Self::new_with_init(layer_sizes, activations, WeightInit::XavierUniform, optimizer, rng)
    }

    /// Like [`NeuralNetwork::new`], drawing every weight matrix from `init`.
    pub fn new_with_init<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        init: WeightInit,
        optimizer: OptimizerWrapper,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(DqnError::invalid_parameter(
                "layer_sizes",
                "network must have at least input and output layers",
            ));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(DqnError::invalid_parameter("layer_sizes", "every layer needs at least one unit"));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(DqnError::invalid_parameter(
                "activations",
                "number of activations must match number of layers - 1",
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new_with_init(window[0], window[1], activation, init, rng))
            .collect::<Vec<_>>();

        Ok(NeuralNetwork {
            layers,
            optimizer,
            loss: LossWrapper::default(),
            learning_rate: 0.001,
        })
    }

    /// ReLU hidden layers followed by a linear Q-value head.
    pub fn q_network<R: Rng + ?Sized>(
        state_size: usize,
        hidden_layers: &[usize],
        action_size: usize,
        init: WeightInit,
        optimizer: OptimizerWrapper,
        rng: &mut R,
    ) -> Result<Self> {
        let mut layer_sizes = Vec::with_capacity(hidden_layers.len() + 2);
        layer_sizes.push(state_size);
        layer_sizes.extend_from_slice(hidden_layers);
        layer_sizes.push(action_size);

        let mut activations = vec![Activation::Relu; hidden_layers.len()];
        activations.push(Activation::Linear);

        Self::new_with_init(&layer_sizes, &activations, init, optimizer, rng)
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_loss(mut self, loss: LossWrapper) -> Self {
        self.loss = loss;
        self
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    fn check_inputs(&self, inputs: ArrayView2<f32>) -> Result<()> {
        if inputs.ncols() != self.input_size() {
            return Err(DqnError::dimension_mismatch(
                format!("{} input features", self.input_size()),
                format!("{}", inputs.ncols()),
            ));
        }
        Ok(())
    }

    /// Inference over a batch of inputs. Does not touch any training state.
    pub fn predict(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_inputs(inputs)?;
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            current = layer.predict(current.view());
        }
        Ok(current)
    }

    /// Inference for a single input vector.
    pub fn predict_one(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        let outputs = self.predict(input.insert_axis(Axis(0)))?;
        Ok(outputs.index_axis_move(Axis(0), 0))
    }

    fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current = inputs.to_owned();
        for layer in &mut self.layers {
            current = layer.forward_batch(current.view());
        }
        current
    }

    fn backward_batch(&self, output_errors: Array2<f32>) -> Result<Vec<(Array2<f32>, Array1<f32>)>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors;

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer.backward_batch(current_error.view())?;
            gradients.push((weight_gradients, bias_gradients));
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        Ok(gradients)
    }

    /// One gradient step over the whole batch.
    ///
    /// Returns the loss of the predictions made *before* the update, which is what a
    /// single-epoch `fit` reports.
    pub fn train_minibatch(
        &mut self,
        inputs: ArrayView2<f32>,
        targets: ArrayView2<f32>,
        learning_rate: f32,
    ) -> Result<f32> {
        self.check_inputs(inputs)?;
        if targets.dim() != (inputs.nrows(), self.output_size()) {
            return Err(DqnError::dimension_mismatch(
                format!("targets of shape ({}, {})", inputs.nrows(), self.output_size()),
                format!("{:?}", targets.dim()),
            ));
        }

        let outputs = self.forward_batch(inputs);
        let loss = self.loss.compute_batch(outputs.view(), targets);
        let output_errors = self.loss.gradient_batch(outputs.view(), targets);
        let gradients = self.backward_batch(output_errors)?;

        for (index, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            self.optimizer.update_weights(index, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(index, &mut layer.biases, &bias_gradients, learning_rate);
            layer.clear_cache();
        }
        self.optimizer.finish_step();

        Ok(loss)
    }

    /// Save the network (parameters, optimizer state, loss and learning rate) with bincode.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = bincode::serialize(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Load a network previously written by [`NeuralNetwork::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        let network: Self = bincode::deserialize(&data)?;
        if network.layers.is_empty() {
            return Err(DqnError::invalid_parameter("model", "model file contains no layers"));
        }
        Ok(network)
    }
}
