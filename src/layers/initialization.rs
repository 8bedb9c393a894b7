use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;
use serde::{Serialize, Deserialize};

use crate::error::{LanderError, Result};

/// Weight initialization strategies.
///
/// All strategies draw from a caller-supplied RNG so that two networks built
/// from the same seed are bit-identical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum WeightInit {
    /// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))` for weights and biases
    #[default]
    FanInUniform,

    /// Xavier/Glorot uniform initialization, zero biases
    XavierUniform,

    /// He/Kaiming uniform initialization (for ReLU), zero biases
    HeUniform,

    /// Uniform distribution with custom range, zero biases
    Uniform { min: f32, max: f32 },

    /// All zeros
    Zeros,
}

impl WeightInit {
    /// Reject a custom range that cannot be sampled.
    pub fn validate(&self) -> Result<()> {
        if let WeightInit::Uniform { min, max } = self {
            if !(min.is_finite() && max.is_finite() && min <= max) {
                return Err(LanderError::invalid_parameter(
                    "weight_init",
                    "uniform range needs finite min <= max",
                ));
            }
        }
        Ok(())
    }

    /// Initialize a `(fan_in, fan_out)` weight matrix
    pub fn initialize_weights<R: Rng + ?Sized>(&self, shape: (usize, usize), rng: &mut R) -> Array2<f32> {
        let (fan_in, fan_out) = shape;

        match self {
            WeightInit::FanInUniform => {
                let limit = 1.0 / (fan_in as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::HeUniform => {
                let limit = (6.0 / fan_in as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::Uniform { min, max } => {
                Array2::random_using(shape, Uniform::new_inclusive(*min, *max), rng)
            }

            WeightInit::Zeros => Array2::zeros(shape),
        }
    }

    /// Initialize the bias vector of a layer with the given fan-in
    pub fn initialize_biases<R: Rng + ?Sized>(&self, fan_in: usize, size: usize, rng: &mut R) -> Array1<f32> {
        match self {
            WeightInit::FanInUniform => {
                let limit = 1.0 / (fan_in as f32).sqrt();
                Array1::random_using(size, Uniform::new_inclusive(-limit, limit), rng)
            }
            WeightInit::XavierUniform
            | WeightInit::HeUniform
            | WeightInit::Uniform { .. }
            | WeightInit::Zeros => Array1::zeros(size),
        }
    }
}
