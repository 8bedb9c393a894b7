use std::collections::VecDeque;
use std::path::Path;
use serde::{Serialize, Deserialize};

/// Stores training metrics over time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Loss of each learning step
    pub losses: VecDeque<f32>,

    /// Mean predicted value of the taken actions at each learning step
    pub q_values: VecDeque<f32>,

    /// Total reward per episode
    pub episode_rewards: VecDeque<f32>,

    /// Steps per episode
    pub episode_lengths: VecDeque<usize>,

    /// Epsilon in effect during each episode
    pub epsilons: VecDeque<f32>,
}

fn push_bounded<T>(values: &mut VecDeque<T>, value: T, limit: usize) {
    if values.len() >= limit {
        values.pop_front();
    }
    values.push_back(value);
}

/// Tracks metrics during training
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    metrics: TrainingMetrics,
    history_size: usize,

    current_episode_reward: f32,
    current_episode_length: usize,
    episode_count: usize,
    total_steps: usize,
}

impl MetricsTracker {
    pub fn new(history_size: usize) -> Self {
        MetricsTracker {
            metrics: TrainingMetrics::default(),
            history_size: history_size.max(1),
            current_episode_reward: 0.0,
            current_episode_length: 0,
            episode_count: 0,
            total_steps: 0,
        }
    }

    /// Record the outcome of a learning step
    pub fn record_learning(&mut self, loss: f32, mean_q: f32) {
        push_bounded(&mut self.metrics.losses, loss, self.history_size);
        push_bounded(&mut self.metrics.q_values, mean_q, self.history_size);
    }

    /// Start a new episode
    pub fn start_episode(&mut self) {
        self.current_episode_reward = 0.0;
        self.current_episode_length = 0;
    }

    /// Record a step within an episode
    pub fn step(&mut self, reward: f32) {
        self.current_episode_reward += reward;
        self.current_episode_length += 1;
        self.total_steps += 1;
    }

    /// End the current episode and return its total reward
    pub fn end_episode(&mut self, epsilon: f32) -> f32 {
        push_bounded(&mut self.metrics.episode_rewards, self.current_episode_reward, self.history_size);
        push_bounded(&mut self.metrics.episode_lengths, self.current_episode_length, self.history_size);
        push_bounded(&mut self.metrics.epsilons, epsilon, self.history_size);
        self.episode_count += 1;
        self.current_episode_reward
    }

    pub fn current_episode_reward(&self) -> f32 {
        self.current_episode_reward
    }

    pub fn current_episode_length(&self) -> usize {
        self.current_episode_length
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

    /// Get recent average loss
    pub fn avg_loss(&self, window: usize) -> Option<f32> {
        mean_of_last(&self.metrics.losses, window)
    }

    /// Get recent average episode reward
    pub fn avg_episode_reward(&self, window: usize) -> Option<f32> {
        mean_of_last(&self.metrics.episode_rewards, window)
    }

    /// Save metrics to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::error::Result<()> {
        let serialized = serde_json::to_string_pretty(&self.metrics)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load metrics from a JSON file
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> crate::error::Result<()> {
        let data = std::fs::read_to_string(path)?;
        self.metrics = serde_json::from_str(&data)?;
        Ok(())
    }
}

fn mean_of_last(values: &VecDeque<f32>, window: usize) -> Option<f32> {
    let n = window.min(values.len());
    if n == 0 {
        return None;
    }
    let sum: f32 = values.iter().rev().take(n).sum();
    Some(sum / n as f32)
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(1000)
    }
}
