//! # Lander - a Deep Q-Network agent for discrete-action control
//!
//! Lander trains a control policy for continuous-observation, discrete-action
//! tasks such as landing a simulated spacecraft. It approximates the
//! action-value function with a small feed-forward network, explores with an
//! epsilon-greedy policy, and stabilizes learning with experience replay and a
//! soft-updated target network.
//!
//! ## Key Features
//!
//! - **Value network**: `S -> 64 -> 64 -> A` with ReLU hidden layers, seeded init
//! - **Replay buffer**: bounded FIFO store with uniform sampling without repeats
//! - **Learning step**: TD targets from the target network, MSE on the taken
//!   action, Adam update, Polyak averaging into the target network
//! - **Training loop**: episode driver with epsilon decay, trailing score window
//!   and solved-criterion checkpointing
//! - **Reproducibility**: every random draw comes from an explicit seeded RNG
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lander::agent::DqnAgent;
//! use lander::config::Config;
//! use lander::trainer::Trainer;
//! # use lander::env::{Environment, Info, Step};
//! # use ndarray::Array1;
//! # struct Lunar;
//! # impl Environment for Lunar {
//! #     fn observation_size(&self) -> usize { 8 }
//! #     fn action_count(&self) -> usize { 4 }
//! #     fn reset(&mut self) -> lander::error::Result<(Array1<f32>, Info)> { Ok((Array1::zeros(8), Info::new())) }
//! #     fn step(&mut self, _a: usize) -> lander::error::Result<Step> { unimplemented!() }
//! # }
//! # let mut env = Lunar;
//!
//! let config = Config::default();
//! let mut agent = DqnAgent::builder(env.observation_size(), env.action_count())
//!     .config(config.agent.clone())
//!     .build()?;
//! let mut trainer = Trainer::new(config.trainer)?;
//! let report = trainer.train(&mut agent, &mut env)?;
//! println!("solved: {} after {} episodes", report.solved, report.episodes);
//! # Ok::<(), lander::error::LanderError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - ReLU and linear activations
//! - [`agent`] - The DQN agent and the traits the trainer drives
//! - [`checkpoint`] - Saving and loading named parameter tensors
//! - [`config`] - Agent and trainer hyperparameters
//! - [`debug`] - Numerical diagnostics and gradient checking
//! - [`device`] - Explicit compute device handle
//! - [`env`] - The environment boundary
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialization
//! - [`loss`] - Loss functions
//! - [`metrics`] - Training metrics and the trailing score window
//! - [`network`] - The action-value network and soft updates
//! - [`optimizer`] - Adam and SGD
//! - [`replay_buffer`] - Experience replay
//! - [`trainer`] - The episode loop and epsilon schedule

pub mod activations;
pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod debug;
pub mod device;
pub mod env;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod trainer;

#[cfg(test)]
mod tests;
