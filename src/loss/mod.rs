//! Loss functions over gathered action-values.
//!
//! The learning step only supervises the value of the action that was taken,
//! so losses here operate on 1-D `[N]` predictions and targets.

pub mod functions;

pub use functions::{Loss, MSE};
