use ndarray::{Array1, ArrayView1};
use rand::Rng;

use crate::error::Result;
use crate::network::StateDict;
use crate::replay_buffer::Transition;

/// Summary of one learning step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnReport {
    /// Mean squared TD error before the update
    pub loss: f32,
    /// Mean predicted value of the taken actions
    pub mean_q: f32,
    /// Learning steps completed so far, including this one
    pub step: usize,
}

/// An agent the training loop can drive.
pub trait LearningAgent {
    /// Epsilon-greedy action for `observation`. Does not modify the agent.
    fn select_action<R: Rng + ?Sized>(&self, observation: ArrayView1<f32>, epsilon: f32, rng: &mut R) -> Result<usize>;

    /// Store a transition and run a learning step when one is due.
    fn record_and_maybe_learn(&mut self, transition: Transition) -> Result<Option<LearnReport>>;

    /// Parameters to persist once training is solved.
    fn checkpoint(&self) -> StateDict;
}

/// Agents that estimate action-values.
pub trait ValueBasedAgent: LearningAgent {
    /// Action-values for an observation
    fn q_values(&self, observation: ArrayView1<f32>) -> Result<Array1<f32>>;

    /// Value of an observation (max action-value)
    fn state_value(&self, observation: ArrayView1<f32>) -> Result<f32> {
        let q_values = self.q_values(observation)?;
        Ok(q_values.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b)))
    }
}
