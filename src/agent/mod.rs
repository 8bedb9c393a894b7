//! # Agents
//!
//! [`DqnAgent`] approximates the action-value function with two networks of
//! one architecture: the online network, trained by gradient descent, and a
//! target network that trails it by soft (Polyak) updates and supplies the
//! bootstrap targets.
//!
//! ```rust
//! use lander::agent::DqnAgent;
//! use lander::config::AgentConfig;
//! use ndarray::Array1;
//! use rand::SeedableRng;
//!
//! let agent = DqnAgent::builder(8, 4)
//!     .config(AgentConfig::default())
//!     .build()
//!     .unwrap();
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let observation = Array1::<f32>::zeros(8);
//! let action = agent.select_action(observation.view(), 0.0, &mut rng).unwrap();
//! assert!(action < 4);
//! ```

pub mod traits;

mod dqn;
pub use dqn::{DqnAgent, DqnAgentBuilder};
pub use traits::{LearnReport, LearningAgent, ValueBasedAgent};
