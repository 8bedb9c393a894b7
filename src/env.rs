//! The environment boundary.
//!
//! The agent never sees environment internals; the training loop talks to
//! anything implementing [`Environment`]: continuous observations of a fixed
//! width and a discrete action space.

use ndarray::Array1;
use std::collections::HashMap;

use crate::error::Result;

/// Free-form diagnostics returned by an environment.
pub type Info = HashMap<String, f32>;

/// Outcome of [`Environment::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Array1<f32>,
    pub reward: f32,
    /// The episode reached a terminal state
    pub terminated: bool,
    /// The episode was cut short (time limit, out of bounds)
    pub truncated: bool,
    pub info: Info,
}

impl Step {
    /// The episode is over, for either reason.
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A continuous-observation, discrete-action control task.
pub trait Environment {
    /// Width of every observation.
    fn observation_size(&self) -> usize;

    /// Number of discrete actions, `[0, action_count)`.
    fn action_count(&self) -> usize;

    /// Start a new episode.
    fn reset(&mut self) -> Result<(Array1<f32>, Info)>;

    /// Apply `action` and advance one step.
    fn step(&mut self, action: usize) -> Result<Step>;
}
