use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::device::Device;
use super::initialization::WeightInit;
use super::traits::{Layer as LayerTrait, LayerCache, LayerGradients, Mode};

/// A fully connected (dense) layer: `activation(inputs · weights + biases)`.
///
/// Weights have shape `(input_size, output_size)`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    /// Create a new dense layer initialized with `init` from `rng`.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Self {
        let weights = init.initialize_weights((input_size, output_size), rng);
        let biases = init.initialize_biases(input_size, output_size, rng);
        DenseLayer {
            weights,
            biases,
            activation,
        }
    }

    fn affine(&self, device: &Device, inputs: ArrayView2<f32>) -> Array2<f32> {
        device.matmul(inputs, self.weights.view()) + &self.biases.view().insert_axis(Axis(0))
    }
}

impl LayerTrait for DenseLayer {
    fn forward_batch(&self, device: &Device, _mode: Mode, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.affine(device, inputs);
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    fn forward_cached(&self, device: &Device, _mode: Mode, inputs: ArrayView2<f32>) -> (Array2<f32>, LayerCache) {
        let pre_activation = self.affine(device, inputs);
        let mut outputs = pre_activation.clone();
        self.activation.apply_batch(&mut outputs);
        let cache = LayerCache {
            inputs: inputs.to_owned(),
            pre_activation,
        };
        (outputs, cache)
    }

    fn backward_batch(
        &self,
        device: &Device,
        cache: &LayerCache,
        output_errors: ArrayView2<f32>,
    ) -> (Array2<f32>, LayerGradients) {
        let activation_deriv = self.activation.derivative_batch(cache.pre_activation.view());
        let adjusted_error = &output_errors * &activation_deriv;
        let weight_gradients = device.matmul(cache.inputs.t(), adjusted_error.view());
        let bias_gradients = adjusted_error.sum_axis(Axis(0));
        let input_error = device.matmul(adjusted_error.view(), self.weights.t());

        (
            input_error,
            LayerGradients {
                weights: weight_gradients,
                biases: bias_gradients,
            },
        )
    }

    fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    fn biases(&self) -> &Array1<f32> {
        &self.biases
    }

    fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer(activation: Activation) -> DenseLayer {
        let mut layer = DenseLayer::new(2, 3, activation, WeightInit::Zeros, &mut StdRng::seed_from_u64(0));
        layer.weights = array![[1.0, -1.0, 0.5], [2.0, 0.0, -0.5]];
        layer.biases = array![0.0, 0.5, -1.0];
        layer
    }

    #[test]
    fn test_forward_batch() {
        let relu = layer(Activation::Relu);
        assert_eq!(relu.input_size(), 2);
        assert_eq!(relu.output_size(), 3);

        let inputs = array![[1.0, 1.0], [-1.0, 0.0]];
        let out = relu.forward_batch(&Device::Cpu, Mode::Eval, inputs.view());
        assert_eq!(out, array![[3.0, 0.0, 0.0], [0.0, 1.5, 0.0]]);

        let linear = layer(Activation::Linear);
        let out = linear.forward_batch(&Device::Cpu, Mode::Eval, inputs.view());
        assert_eq!(out, array![[3.0, -0.5, -1.0], [-1.0, 1.5, -1.5]]);
    }

    #[test]
    fn test_backward_batch() {
        let relu = layer(Activation::Relu);
        let inputs = array![[1.0, 1.0]];
        let (out, cache) = relu.forward_cached(&Device::Cpu, Mode::Train, inputs.view());
        assert_eq!(out, array![[3.0, 0.0, 0.0]]);

        // only the first unit is active
        let (input_error, grads) = relu.backward_batch(&Device::Cpu, &cache, array![[1.0, 1.0, 1.0]].view());
        assert_eq!(grads.weights, array![[1.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(grads.biases, array![1.0, 0.0, 0.0]);
        assert_eq!(input_error, array![[1.0, 2.0]]);
    }
}
