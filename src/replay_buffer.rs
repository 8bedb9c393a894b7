//! Bounded experience replay with uniform sampling.

use ndarray::{Array1, Array2};
use rand::seq::index;
use rand::Rng;
use std::collections::VecDeque;

use crate::error::{LanderError, Result};

/// One environment step: `(state, action, reward, next_state, done)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

impl Transition {
    pub fn new(state: Array1<f32>, action: usize, reward: f32, next_state: Array1<f32>, done: bool) -> Self {
        Transition {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// A minibatch laid out as five index-aligned arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// `[k, S]`
    pub states: Array2<f32>,
    /// `[k]`
    pub actions: Array1<usize>,
    /// `[k]`
    pub rewards: Array1<f32>,
    /// `[k, S]`
    pub next_states: Array2<f32>,
    /// `[k]`, `1.0` for terminal transitions and `0.0` otherwise
    pub dones: Array1<f32>,
}

impl Batch {
    /// Stack transitions into a batch. Every state and next state must have the same width.
    pub fn from_transitions(transitions: &[&Transition]) -> Result<Self> {
        let first = transitions
            .first()
            .ok_or_else(|| LanderError::InsufficientData { requested: 1, available: 0 })?;
        let state_size = first.state.len();
        let batch_size = transitions.len();

        let mut states = Array2::zeros((batch_size, state_size));
        let mut next_states = Array2::zeros((batch_size, state_size));
        let mut actions = Array1::zeros(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut dones = Array1::zeros(batch_size);

        for (i, t) in transitions.iter().enumerate() {
            if t.state.len() != state_size || t.next_state.len() != state_size {
                return Err(LanderError::shape_mismatch(
                    format!("states of width {}", state_size),
                    format!("{} and {} in row {}", t.state.len(), t.next_state.len(), i),
                ));
            }
            states.row_mut(i).assign(&t.state);
            next_states.row_mut(i).assign(&t.next_state);
            actions[i] = t.action;
            rewards[i] = t.reward;
            dones[i] = if t.done { 1.0 } else { 0.0 };
        }

        Ok(Batch {
            states,
            actions,
            rewards,
            next_states,
            dones,
        })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// FIFO ring of transitions. Pushing at capacity evicts the oldest entry.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
    state_size: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize, state_size: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(LanderError::invalid_parameter("buffer_capacity", "must be at least 1"));
        }
        Ok(ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            state_size,
        })
    }

    pub fn push(&mut self, transition: Transition) -> Result<()> {
        if transition.state.len() != self.state_size || transition.next_state.len() != self.state_size {
            return Err(LanderError::shape_mismatch(
                format!("states of width {}", self.state_size),
                format!("{} and {}", transition.state.len(), transition.next_state.len()),
            ));
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
        Ok(())
    }

    /// `k` distinct positions drawn uniformly from the held transitions.
    pub fn sample_indices<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Result<Vec<usize>> {
        if self.buffer.len() < k {
            return Err(LanderError::InsufficientData {
                requested: k,
                available: self.buffer.len(),
            });
        }
        Ok(index::sample(rng, self.buffer.len(), k).into_vec())
    }

    /// Draw `k` transitions without repeats and stack them into a [`Batch`].
    pub fn sample<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Result<Batch> {
        if k == 0 {
            return Err(LanderError::invalid_parameter("batch_size", "must be at least 1"));
        }
        let indices = self.sample_indices(k, rng)?;
        let transitions: Vec<&Transition> = indices.iter().map(|&i| &self.buffer[i]).collect();
        Batch::from_transitions(&transitions)
    }

    /// Transition at `index`, where 0 is the oldest retained one.
    pub fn get(&self, index: usize) -> Option<&Transition> {
        self.buffer.get(index)
    }

    /// Transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }
}
