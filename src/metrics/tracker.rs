use std::collections::VecDeque;
use std::path::Path;
use serde::{Serialize, Deserialize};

use super::{EpisodeSummary, MetricsSink};
use crate::error::Result;

/// Stores training metrics over time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Summed training loss per episode
    pub losses: VecDeque<f32>,

    /// Rewards per episode, one history per player seat
    pub episode_rewards: Vec<VecDeque<f32>>,

    /// Episode lengths
    pub episode_lengths: VecDeque<usize>,

    /// Epsilon at the end of each episode
    pub epsilons: VecDeque<f32>,
}

fn push_bounded<T>(history: &mut VecDeque<T>, value: T, limit: usize) {
    if history.len() >= limit {
        history.pop_front();
    }
    history.push_back(value);
}

fn tail_mean(values: impl DoubleEndedIterator<Item = f32> + ExactSizeIterator, window: usize) -> Option<f32> {
    let n = window.min(values.len());
    if n == 0 {
        return None;
    }
    let sum: f32 = values.rev().take(n).sum();
    Some(sum / n as f32)
}

/// Tracks episode summaries in memory and answers rolling averages over them.
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    metrics: TrainingMetrics,
    history_size: usize,
    episode_count: usize,
    total_steps: usize,
}

impl MetricsTracker {
    pub fn new(history_size: usize) -> Self {
        MetricsTracker {
            metrics: TrainingMetrics::default(),
            history_size: history_size.max(1),
            episode_count: 0,
            total_steps: 0,
        }
    }

    /// Fold one episode into the history, dropping the oldest entries past `history_size`.
    pub fn record_episode(&mut self, summary: &EpisodeSummary) {
        let limit = self.history_size;
        push_bounded(&mut self.metrics.losses, summary.loss, limit);
        push_bounded(&mut self.metrics.episode_lengths, summary.steps, limit);
        push_bounded(&mut self.metrics.epsilons, summary.epsilon, limit);

        if self.metrics.episode_rewards.len() < summary.rewards.len() {
            self.metrics.episode_rewards.resize_with(summary.rewards.len(), VecDeque::new);
        }
        for (seat, history) in self.metrics.episode_rewards.iter_mut().enumerate() {
            push_bounded(history, summary.reward(seat), limit);
        }

        self.episode_count += 1;
        self.total_steps += summary.steps;
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn episode_count(&self) -> usize {
        self.episode_count
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Mean episode loss over the last `window` episodes
    pub fn avg_loss(&self, window: usize) -> Option<f32> {
        tail_mean(self.metrics.losses.iter().copied(), window)
    }

    /// Mean reward of `seat` over the last `window` episodes
    pub fn avg_episode_reward(&self, seat: usize, window: usize) -> Option<f32> {
        let history = self.metrics.episode_rewards.get(seat)?;
        tail_mean(history.iter().copied(), window)
    }

    pub fn last_epsilon(&self) -> Option<f32> {
        self.metrics.epsilons.back().copied()
    }

    pub fn clear(&mut self) {
        self.metrics = TrainingMetrics::default();
        self.episode_count = 0;
        self.total_steps = 0;
    }

    /// Save metrics to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.metrics)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load metrics from a JSON file
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let data = std::fs::read_to_string(path)?;
        self.metrics = serde_json::from_str(&data)?;
        Ok(())
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(100)
    }
}

impl MetricsSink for MetricsTracker {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.record_episode(summary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn summary(episode: usize, rewards: Vec<f32>) -> EpisodeSummary {
        EpisodeSummary {
            episode,
            epsilon: 1.0 / (episode + 1) as f32,
            loss: episode as f32,
            steps: 10,
            rewards,
            reward_averages: Vec::new(),
        }
    }

    #[test]
    fn test_rolling_window() {
        let mut tracker = MetricsTracker::new(3);
        for episode in 0..5 {
            tracker.record_episode(&summary(episode, vec![episode as f32, -(episode as f32)]));
        }

        assert_eq!(tracker.episode_count(), 5);
        assert_eq!(tracker.total_steps(), 50);
        assert_eq!(tracker.metrics().losses, VecDeque::from(vec![2.0, 3.0, 4.0]));
        assert_relative_eq!(tracker.avg_episode_reward(0, 100).unwrap(), 3.0);
        assert_relative_eq!(tracker.avg_episode_reward(1, 2).unwrap(), -3.5);
        assert_relative_eq!(tracker.avg_loss(1).unwrap(), 4.0);
        assert_eq!(tracker.avg_episode_reward(2, 10), None);
    }

    #[test]
    fn test_missing_seats_count_as_zero() {
        let mut tracker = MetricsTracker::default();
        tracker.record_episode(&summary(0, vec![1.0, 1.0]));
        tracker.record_episode(&summary(1, vec![3.0]));
        assert_relative_eq!(tracker.avg_episode_reward(1, 10).unwrap(), 0.5);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");

        let mut tracker = MetricsTracker::default();
        tracker.record_episode(&summary(0, vec![2.0]));
        tracker.save(&path).unwrap();

        let mut restored = MetricsTracker::default();
        restored.load(&path).unwrap();
        assert_eq!(restored.metrics(), tracker.metrics());
    }
}
