//! Hyperparameters for the agent and the training loop.
//!
//! Both structs deserialize from JSON with every field optional; missing
//! fields take the defaults of an 8-observation, 4-action lander task.

use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};

use crate::error::{LanderError, Result};
use crate::layers::WeightInit;
use crate::network::DEFAULT_HIDDEN_SIZES;
use crate::optimizer::OptimizerKind;

/// Agent hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub learning_rate: f32,
    /// Transitions per learning step
    pub minibatch_size: usize,
    /// Discount factor (gamma)
    pub discount_factor: f32,
    pub buffer_capacity: usize,
    /// Soft update interpolation factor
    pub tau: f32,
    /// Environment steps between learning steps
    pub update_period: usize,
    pub hidden_sizes: Vec<usize>,
    /// Initialization of both networks' parameters
    pub weight_init: WeightInit,
    pub optimizer: OptimizerKind,
    /// Seed for network initialization and replay sampling
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            learning_rate: 5e-4,
            minibatch_size: 100,
            discount_factor: 0.99,
            buffer_capacity: 100_000,
            tau: 1e-3,
            update_period: 4,
            hidden_sizes: DEFAULT_HIDDEN_SIZES.to_vec(),
            weight_init: WeightInit::FanInUniform,
            optimizer: OptimizerKind::Adam,
            seed: 42,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(LanderError::invalid_parameter("learning_rate", "must be positive and finite"));
        }
        if self.minibatch_size == 0 {
            return Err(LanderError::invalid_parameter("minibatch_size", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(LanderError::invalid_parameter("discount_factor", "must be in [0, 1]"));
        }
        if self.buffer_capacity <= self.minibatch_size {
            return Err(LanderError::invalid_parameter(
                "buffer_capacity",
                "must be larger than minibatch_size",
            ));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return Err(LanderError::invalid_parameter("tau", "must be in (0, 1]"));
        }
        if self.update_period == 0 {
            return Err(LanderError::invalid_parameter("update_period", "must be at least 1"));
        }
        if self.hidden_sizes.iter().any(|&h| h == 0) {
            return Err(LanderError::invalid_parameter("hidden_sizes", "every hidden layer needs at least 1 unit"));
        }
        self.weight_init.validate()
    }
}

/// Training loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub max_episodes: usize,
    pub max_steps_per_episode: usize,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    /// Multiplicative decay applied once per episode
    pub epsilon_decay: f32,
    /// Trailing mean score at which training stops
    pub solved_threshold: f32,
    /// Number of episodes in the trailing score window
    pub solved_window: usize,
    /// Episodes between progress lines at info level
    pub log_every: usize,
    /// Seed for exploration
    pub seed: u64,
    /// Where to write the online network once solved
    pub checkpoint_path: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            max_episodes: 2000,
            max_steps_per_episode: 1000,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            solved_threshold: 200.0,
            solved_window: 100,
            log_every: 100,
            seed: 42,
            checkpoint_path: None,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps_per_episode == 0 {
            return Err(LanderError::invalid_parameter("max_steps_per_episode", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(LanderError::invalid_parameter("epsilon_min", "must be in [0, 1]"));
        }
        if !(self.epsilon_min..=1.0).contains(&self.epsilon_start) {
            return Err(LanderError::invalid_parameter("epsilon_start", "must be in [epsilon_min, 1]"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(LanderError::invalid_parameter("epsilon_decay", "must be in (0, 1]"));
        }
        if self.solved_window == 0 {
            return Err(LanderError::invalid_parameter("solved_window", "must be at least 1"));
        }
        if !self.solved_threshold.is_finite() {
            return Err(LanderError::invalid_parameter("solved_threshold", "must be finite"));
        }
        Ok(())
    }
}

/// Agent and trainer settings as stored in one JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub trainer: TrainerConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        self.trainer.validate()
    }

    /// Load and validate a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.minibatch_size, 100);
        assert_eq!(config.agent.buffer_capacity, 100_000);
        assert_eq!(config.trainer.solved_window, 100);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"agent": {"tau": 0.01}}"#).unwrap();
        assert_eq!(config.agent.tau, 0.01);
        assert_eq!(config.agent.update_period, 4);
        assert_eq!(config.trainer.max_episodes, 2000);
    }

    #[test]
    fn test_weight_init_from_json() {
        let config: Config =
            serde_json::from_str(r#"{"agent": {"weight_init": {"Uniform": {"min": -0.1, "max": 0.1}}}}"#).unwrap();
        assert_eq!(config.agent.weight_init, WeightInit::Uniform { min: -0.1, max: 0.1 });
        assert!(config.validate().is_ok());

        let config: Config = serde_json::from_str(r#"{"agent": {"weight_init": "XavierUniform"}}"#).unwrap();
        assert_eq!(config.agent.weight_init, WeightInit::XavierUniform);

        let mut agent = AgentConfig::default();
        agent.weight_init = WeightInit::Uniform { min: 0.5, max: -0.5 };
        assert!(matches!(agent.validate(), Err(LanderError::InvalidParameter { .. })));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut agent = AgentConfig::default();
        agent.tau = 0.0;
        assert!(matches!(agent.validate(), Err(LanderError::InvalidParameter { .. })));

        let mut trainer = TrainerConfig::default();
        trainer.epsilon_decay = 1.5;
        assert!(trainer.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.trainer.max_episodes = 10;
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
