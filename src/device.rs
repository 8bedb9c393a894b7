//! Compute device handle.
//!
//! Every network is built against an explicit [`Device`] and routes its
//! matrix products through it. Only the CPU backend exists today; the handle
//! keeps device choice out of global state.

use ndarray::{Array2, ArrayView2};
use serde::{Serialize, Deserialize};
use std::fmt;

/// Supported compute devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Device {
    #[default]
    Cpu,
}

impl Device {
    /// Matrix multiplication `a · b`
    pub fn matmul(&self, a: ArrayView2<f32>, b: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Device::Cpu => a.dot(&b),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cpu_matmul() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[1.0], [1.0]];
        let out = Device::Cpu.matmul(a.view(), b.view());
        assert_eq!(out, array![[3.0], [7.0]]);
        assert_eq!(Device::default().to_string(), "cpu");
    }
}
