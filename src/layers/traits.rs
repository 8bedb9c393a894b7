use ndarray::{Array1, Array2, ArrayView2};
use serde::{Serialize, Deserialize};

use crate::device::Device;

/// Execution mode of a forward pass.
///
/// Passed to every layer on every call: inference passes run in `Eval`,
/// passes that feed backprop run in `Train`. Dense layers behave the same in
/// both; layers with mode-dependent behaviour (dropout, batch statistics)
/// branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Train,
    Eval,
}

/// Values recorded during a training forward pass, consumed by backprop.
#[derive(Debug, Clone)]
pub struct LayerCache {
    pub inputs: Array2<f32>,
    pub pre_activation: Array2<f32>,
}

/// Parameter gradients of a single layer.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// Trait defining the interface for neural network layers
pub trait Layer: Send + Sync {
    /// Forward propagation for a batch of inputs, without recording anything
    fn forward_batch(&self, device: &Device, mode: Mode, inputs: ArrayView2<f32>) -> Array2<f32>;

    /// Forward propagation that also returns the cache needed by `backward_batch`
    fn forward_cached(&self, device: &Device, mode: Mode, inputs: ArrayView2<f32>) -> (Array2<f32>, LayerCache);

    /// Backward propagation for a batch of output errors.
    ///
    /// Returns the error with respect to the layer inputs and the parameter gradients.
    fn backward_batch(
        &self,
        device: &Device,
        cache: &LayerCache,
        output_errors: ArrayView2<f32>,
    ) -> (Array2<f32>, LayerGradients);

    fn weights(&self) -> &Array2<f32>;

    fn biases(&self) -> &Array1<f32>;

    fn input_size(&self) -> usize;

    fn output_size(&self) -> usize;
}
