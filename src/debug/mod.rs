//! Diagnostics for diverging or misbehaving networks.

pub mod gradient_check;
pub mod numerical_check;

pub use gradient_check::gradient_check;
pub use numerical_check::{check_gradients, check_network, NumericalIssue};
