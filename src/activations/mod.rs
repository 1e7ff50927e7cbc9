//! # Activation Functions
//!
//! Element-wise non-linearities applied after each dense layer of a Q-network.
//!
//! - **ReLU**: `max(0, x)`, the hidden-layer default
//! - **Linear**: identity, used for the Q-value output layer
//! - **Tanh**: hyperbolic tangent
//! - **LeakyReLU**: ReLU with a small negative slope

pub mod functions;

pub use functions::Activation;
