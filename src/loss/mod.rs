//! Loss functions minimised by [`NeuralNetwork::train_minibatch`](crate::network::NeuralNetwork::train_minibatch).
//!
//! Q-networks default to mean squared error; Huber is offered for noisier reward signals.

pub mod functions;

pub use functions::{Loss, LossWrapper, Mse, HuberLoss};
