//! Per-episode training metrics.
//!
//! The [`Trainer`](crate::runner::Trainer) reports one [`EpisodeSummary`] per finished
//! episode to a [`MetricsSink`]. Two sinks ship with the crate: the in-memory
//! [`MetricsTracker`] and the [`CsvMetricsWriter`].

use serde::{Serialize, Deserialize};

use crate::error::Result;

pub mod csv_writer;
pub mod tracker;

pub use csv_writer::CsvMetricsWriter;
pub use tracker::{MetricsTracker, TrainingMetrics};

/// What happened during one episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    /// Exploration rate at the end of the episode
    pub epsilon: f32,
    /// Sum of the losses of the episode's training steps
    pub loss: f32,
    pub steps: usize,
    /// Accumulated reward per player seat
    pub rewards: Vec<f32>,
    /// Rolling average of `rewards` per seat, including this episode. Filled in by the
    /// trainer from its window; empty when nobody computed it.
    #[serde(default)]
    pub reward_averages: Vec<f32>,
}

impl EpisodeSummary {
    /// Reward of `seat`, or 0 when the seat collected nothing.
    pub fn reward(&self, seat: usize) -> f32 {
        self.rewards.get(seat).copied().unwrap_or(0.0)
    }

    pub fn reward_average(&self, seat: usize) -> Option<f32> {
        self.reward_averages.get(seat).copied()
    }
}

/// Receives episode summaries.
pub trait MetricsSink {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        (**self).record(summary)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
