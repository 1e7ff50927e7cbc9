use ndarray::{Array2, ArrayView2};
use serde::{Serialize, Deserialize};

/// Trait defining the interface for loss functions
pub trait Loss {
    /// Compute the loss for a batch of predictions and targets
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32;

    /// Compute the gradient of the loss with respect to the predictions
    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32>;
}

/// Mean squared error, averaged over every element of the batch
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct Mse;

impl Loss for Mse {
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        let diff = &predictions - &targets;
        (&diff * &diff).mean().unwrap_or(0.0)
    }

    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        let n = predictions.len().max(1) as f32;
        (&predictions - &targets) * (2.0 / n)
    }
}

/// Huber loss (smooth L1)
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct HuberLoss {
    pub delta: f32,
}

impl HuberLoss {
    pub fn new(delta: f32) -> Self {
        HuberLoss { delta }
    }
}

impl Loss for HuberLoss {
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        let diff = &predictions - &targets;
        diff.mapv(|x| {
            let abs_x = x.abs();
            if abs_x <= self.delta {
                0.5 * x * x
            } else {
                self.delta * abs_x - 0.5 * self.delta * self.delta
            }
        }).mean().unwrap_or(0.0)
    }

    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        let n = predictions.len().max(1) as f32;
        let diff = &predictions - &targets;
        diff.mapv(|x| {
            if x.abs() <= self.delta {
                x
            } else {
                self.delta * x.signum()
            }
        }) / n
    }
}

/// Serializable choice of loss stored alongside the network
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub enum LossWrapper {
    Mse(Mse),
    Huber(HuberLoss),
}

impl Default for LossWrapper {
    fn default() -> Self {
        LossWrapper::Mse(Mse)
    }
}

impl Loss for LossWrapper {
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        match self {
            LossWrapper::Mse(loss) => loss.compute_batch(predictions, targets),
            LossWrapper::Huber(loss) => loss.compute_batch(predictions, targets),
        }
    }

    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        match self {
            LossWrapper::Mse(loss) => loss.gradient_batch(predictions, targets),
            LossWrapper::Huber(loss) => loss.gradient_batch(predictions, targets),
        }
    }
}
