use log::info;
use ndarray::{Array2, ArrayView2};

use crate::approximator::QFunction;
use crate::error::Result;

/// A frozen snapshot of the online model used for bootstrap estimates.
///
/// The snapshot only changes through [`TargetNetwork::sync`]; gradient steps on the online
/// model are never visible here in between.
#[derive(Clone, Debug)]
pub struct TargetNetwork<M> {
    model: M,
    tau: usize,
    max_tau: usize,
}

impl<M: QFunction> TargetNetwork<M> {
    /// Snapshot `online` and start counting from zero.
    pub fn new(online: &M, max_tau: usize) -> Self {
        TargetNetwork {
            model: online.snapshot(),
            tau: 0,
            max_tau,
        }
    }

    /// Copy every parameter of `online` and reset the step counter.
    pub fn sync(&mut self, online: &M) {
        info!("updating target network");
        self.model = online.snapshot();
        self.tau = 0;
    }

    /// Count one training step, syncing once more than `max_tau` steps have passed.
    ///
    /// Returns whether a sync happened.
    pub fn tick(&mut self, online: &M) -> bool {
        self.tau += 1;
        if self.tau > self.max_tau {
            self.sync(online);
            true
        } else {
            false
        }
    }

    pub fn predict(&self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.model.predict(states)
    }

    /// Read-only access to the snapshot.
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn tau(&self) -> usize {
        self.tau
    }

    pub fn max_tau(&self) -> usize {
        self.max_tau
    }
}
