use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};
use crate::activations::Activation;
use crate::error::{DqnError, Result};
use super::initialization::WeightInit;

/// Values remembered by a training forward pass for the backward pass
#[derive(Clone, Debug)]
struct ForwardCache {
    inputs: Array2<f32>,
    pre_activation: Array2<f32>,
}

/// A fully connected (dense) layer in a neural network
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    cache: Option<ForwardCache>,
}

impl DenseLayer {
    /// Create a new dense layer with Xavier-uniform weights and zero biases.
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, activation: Activation, rng: &mut R) -> Self {
        Self::new_with_init(input_size, output_size, activation, WeightInit::XavierUniform, rng)
    }

    pub fn new_with_init<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Self {
        DenseLayer {
            weights: init.initialize_weights((input_size, output_size), rng),
            biases: init.initialize_biases(output_size),
            activation,
            cache: None,
        }
    }

    /// Replace the weights; the shape must stay `(input_size, output_size)`.
    pub fn with_weights(mut self, weights: Array2<f32>) -> Result<Self> {
        if weights.dim() != self.weights.dim() {
            return Err(DqnError::dimension_mismatch(
                format!("weights of shape {:?}", self.weights.dim()),
                format!("{:?}", weights.dim()),
            ));
        }
        self.weights = weights;
        Ok(self)
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Result<Self> {
        if biases.len() != self.biases.len() {
            return Err(DqnError::dimension_mismatch(
                format!("{} biases", self.biases.len()),
                format!("{}", biases.len()),
            ));
        }
        self.biases = biases;
        Ok(self)
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    fn affine(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0))
    }

    /// Inference-only forward pass; leaves the layer untouched.
    pub fn predict(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.affine(inputs);
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Training forward pass. Remembers inputs and pre-activations for `backward_batch`.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let pre_activation = self.affine(inputs);
        let mut outputs = pre_activation.clone();
        self.activation.apply_batch(&mut outputs);
        self.cache = Some(ForwardCache {
            inputs: inputs.to_owned(),
            pre_activation,
        });
        outputs
    }

    /// Gradients for a batch of output errors.
    ///
    /// Returns `(adjusted_error, weight_gradients, bias_gradients)` where the adjusted error is the
    /// output error multiplied by the activation derivative, ready to be propagated to the
    /// previous layer.
    pub fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<(Array2<f32>, Array2<f32>, Array1<f32>)> {
        let cache = self.cache.as_ref().ok_or_else(|| {
            DqnError::NumericalError("backward_batch() called before forward_batch()".to_string())
        })?;

        let activation_deriv = self.activation.derivative_batch(cache.pre_activation.view());
        let adjusted_error = &output_errors * &activation_deriv;
        let weight_gradients = cache.inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));

        Ok((adjusted_error, weight_gradients, bias_gradients))
    }

    /// Drop the training cache so snapshots carry parameters only
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn layer() -> DenseLayer {
        DenseLayer::new(2, 2, Activation::Relu, &mut StdRng::seed_from_u64(0))
            .with_weights(array![[1.0, -1.0], [2.0, 0.5]])
            .unwrap()
            .with_biases(array![0.5, 0.0])
            .unwrap()
    }

    #[test]
    fn test_setters_reject_wrong_shapes() {
        let fresh = || DenseLayer::new(2, 3, Activation::Linear, &mut StdRng::seed_from_u64(0));
        assert!(matches!(
            fresh().with_weights(Array2::zeros((3, 2))),
            Err(DqnError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            fresh().with_biases(Array1::zeros(2)),
            Err(DqnError::DimensionMismatch { .. })
        ));
        assert_eq!(fresh().with_biases(Array1::ones(3)).unwrap().biases, Array1::<f32>::ones(3));
    }

    #[test]
    fn test_predict_matches_forward() {
        let mut layer = layer();
        let inputs = array![[1.0, 1.0], [-1.0, 0.0]];
        let predicted = layer.predict(inputs.view());
        let trained = layer.forward_batch(inputs.view());
        assert_eq!(predicted, trained);
        assert_eq!(predicted, array![[3.5, 0.0], [0.0, 1.0]]);
    }

    #[test]
    fn test_backward_requires_forward() {
        let layer = layer();
        let errors = array![[1.0, 1.0]];
        assert!(layer.backward_batch(errors.view()).is_err());
    }

    #[test]
    fn test_backward_masks_inactive_units() {
        let mut layer = layer();
        let inputs = array![[1.0, 1.0]];
        layer.forward_batch(inputs.view());
        // second unit is inactive: pre-activation is -0.5
        let (adjusted, weight_grads, bias_grads) = layer.backward_batch(array![[1.0, 1.0]].view()).unwrap();
        assert_eq!(adjusted, array![[1.0, 0.0]]);
        assert_eq!(weight_grads, array![[1.0, 0.0], [1.0, 0.0]]);
        assert_eq!(bias_grads, array![1.0, 0.0]);
    }
}
