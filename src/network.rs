//! The action-value approximator.
//!
//! [`QNetwork`] maps an observation vector of width `S` to `A` action-values
//! through a stack of dense layers: ReLU on every hidden layer and a linear
//! output layer. The agent builds two of them from the same architecture
//! (online and target) and keeps the target trailing the online network with
//! [`soft_update`].

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

use crate::activations::Activation;
use crate::device::Device;
use crate::error::{LanderError, Result};
use crate::layers::{DenseLayer, LayerCache, LayerGradients, LayerTrait, Mode, WeightInit};

/// Default hidden layer widths
pub const DEFAULT_HIDDEN_SIZES: [usize; 2] = [64, 64];

/// A named parameter tensor as it appears in a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Mapping from parameter names (`fc1.weight`, `fc1.bias`, ...) to tensors.
pub type StateDict = BTreeMap<String, Tensor>;

/// Layer sizes and initialization shared by the online and target networks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    pub state_size: usize,
    pub action_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub weight_init: WeightInit,
}

impl Architecture {
    pub fn new(state_size: usize, action_size: usize, hidden_sizes: &[usize]) -> Result<Self> {
        if state_size == 0 {
            return Err(LanderError::invalid_parameter("state_size", "must be at least 1"));
        }
        if action_size == 0 {
            return Err(LanderError::invalid_parameter("action_size", "must be at least 1"));
        }
        if hidden_sizes.iter().any(|&h| h == 0) {
            return Err(LanderError::invalid_parameter("hidden_sizes", "every hidden layer needs at least 1 unit"));
        }
        Ok(Architecture {
            state_size,
            action_size,
            hidden_sizes: hidden_sizes.to_vec(),
            weight_init: WeightInit::default(),
        })
    }

    /// Use `weight_init` instead of the fan-in uniform default.
    pub fn with_weight_init(mut self, weight_init: WeightInit) -> Result<Self> {
        weight_init.validate()?;
        self.weight_init = weight_init;
        Ok(self)
    }

    /// `[state_size, hidden..., action_size]`
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_sizes.len() + 2);
        sizes.push(self.state_size);
        sizes.extend_from_slice(&self.hidden_sizes);
        sizes.push(self.action_size);
        sizes
    }

    /// Instantiate a network with this architecture, drawing parameters from `rng`.
    pub fn build<R: Rng + ?Sized>(&self, device: Device, rng: &mut R) -> QNetwork {
        let sizes = self.layer_sizes();
        let last = sizes.len() - 2;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(i, window)| {
                let activation = if i == last { Activation::Linear } else { Activation::Relu };
                DenseLayer::new(window[0], window[1], activation, self.weight_init, rng)
            })
            .collect();

        QNetwork {
            architecture: self.clone(),
            layers,
            device,
        }
    }
}

/// Gradients for every layer of a [`QNetwork`], ordered input to output.
pub type Gradients = Vec<LayerGradients>;

/// A feed-forward action-value network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QNetwork {
    architecture: Architecture,
    pub layers: Vec<DenseLayer>,
    device: Device,
}

impl QNetwork {
    /// Build a network with the default `S -> 64 -> 64 -> A` shape.
    pub fn new<R: Rng + ?Sized>(state_size: usize, action_size: usize, device: Device, rng: &mut R) -> Result<Self> {
        let architecture = Architecture::new(state_size, action_size, &DEFAULT_HIDDEN_SIZES)?;
        Ok(architecture.build(device, rng))
    }

    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    pub fn state_size(&self) -> usize {
        self.architecture.state_size
    }

    pub fn action_size(&self) -> usize {
        self.architecture.action_size
    }

    pub fn device(&self) -> Device {
        self.device
    }

    fn check_input_width(&self, width: usize) -> Result<()> {
        if width != self.state_size() {
            return Err(LanderError::shape_mismatch(
                format!("observation of width {}", self.state_size()),
                format!("width {}", width),
            ));
        }
        Ok(())
    }

    /// Action-values for a single observation.
    pub fn forward(&self, observation: ArrayView1<f32>) -> Result<Array1<f32>> {
        let batch = observation.insert_axis(Axis(0));
        let output = self.forward_batch(batch)?;
        Ok(output.index_axis_move(Axis(0), 0))
    }

    /// Action-values for a batch of observations, `[N, S] -> [N, A]`, in inference mode.
    pub fn forward_batch(&self, observations: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input_width(observations.ncols())?;
        Ok(infer(&self.layers, &self.device, observations))
    }

    /// Training-mode forward pass that keeps the per-layer caches for [`QNetwork::backward`].
    pub fn forward_train(&self, observations: ArrayView2<f32>) -> Result<(Array2<f32>, Vec<LayerCache>)> {
        self.check_input_width(observations.ncols())?;
        Ok(forward_recorded(&self.layers, &self.device, observations))
    }

    /// Backpropagate `output_grad` (dLoss/dOutput, shape `[N, A]`) through the layers.
    pub fn backward(&self, caches: &[LayerCache], output_grad: ArrayView2<f32>) -> Result<Gradients> {
        if caches.len() != self.layers.len() {
            return Err(LanderError::shape_mismatch(
                format!("{} layer caches", self.layers.len()),
                format!("{}", caches.len()),
            ));
        }
        if output_grad.ncols() != self.action_size() {
            return Err(LanderError::shape_mismatch(
                format!("output gradient of width {}", self.action_size()),
                format!("width {}", output_grad.ncols()),
            ));
        }

        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_grad.to_owned();
        for (layer, cache) in self.layers.iter().zip(caches).rev() {
            let (input_error, layer_gradients) = layer.backward_batch(&self.device, cache, current_error.view());
            gradients.push(layer_gradients);
            current_error = input_error;
        }
        gradients.reverse();
        Ok(gradients)
    }

    /// Names of the parameter tensors, in layer order.
    pub fn parameter_names(&self) -> Vec<String> {
        (1..=self.layers.len())
            .flat_map(|i| [format!("fc{}.weight", i), format!("fc{}.bias", i)])
            .collect()
    }

    /// Snapshot of every parameter as a named tensor.
    pub fn state_dict(&self) -> StateDict {
        let mut dict = StateDict::new();
        for (i, layer) in self.layers.iter().enumerate() {
            dict.insert(
                format!("fc{}.weight", i + 1),
                Tensor {
                    shape: layer.weights.shape().to_vec(),
                    data: layer.weights.iter().copied().collect(),
                },
            );
            dict.insert(
                format!("fc{}.bias", i + 1),
                Tensor {
                    shape: layer.biases.shape().to_vec(),
                    data: layer.biases.to_vec(),
                },
            );
        }
        dict
    }

    /// Overwrite the parameters from a state dict with matching names and shapes.
    pub fn load_state_dict(&mut self, dict: &StateDict) -> Result<()> {
        let mut weights = Vec::with_capacity(self.layers.len());
        let mut biases = Vec::with_capacity(self.layers.len());

        for (i, layer) in self.layers.iter().enumerate() {
            let weight_name = format!("fc{}.weight", i + 1);
            let bias_name = format!("fc{}.bias", i + 1);

            let weight = lookup(dict, &weight_name, layer.weights.shape())?;
            let bias = lookup(dict, &bias_name, layer.biases.shape())?;

            let weight = Array2::from_shape_vec(layer.weights.dim(), weight.data.clone())
                .map_err(|e| LanderError::shape_mismatch(weight_name, e.to_string()))?;
            weights.push(weight);
            biases.push(Array1::from_vec(bias.data.clone()));
        }

        for ((layer, w), b) in self.layers.iter_mut().zip(weights).zip(biases) {
            layer.weights = w;
            layer.biases = b;
        }
        Ok(())
    }

    /// Whether every parameter is finite.
    pub fn is_finite(&self) -> bool {
        self.layers.iter().all(|layer| {
            layer.weights.iter().all(|w| w.is_finite()) && layer.biases.iter().all(|b| b.is_finite())
        })
    }

    /// Total number of scalar parameters.
    pub fn num_parameters(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weights.len() + layer.biases.len())
            .sum()
    }
}

/// Inference pass through a layer stack.
pub(crate) fn infer<L: LayerTrait>(layers: &[L], device: &Device, inputs: ArrayView2<f32>) -> Array2<f32> {
    let mut current = inputs.to_owned();
    for layer in layers {
        current = layer.forward_batch(device, Mode::Eval, current.view());
    }
    current
}

/// Training pass through a layer stack, returning one cache per layer.
pub(crate) fn forward_recorded<L: LayerTrait>(
    layers: &[L],
    device: &Device,
    inputs: ArrayView2<f32>,
) -> (Array2<f32>, Vec<LayerCache>) {
    let mut caches = Vec::with_capacity(layers.len());
    let mut current = inputs.to_owned();
    for layer in layers {
        let (output, cache) = layer.forward_cached(device, Mode::Train, current.view());
        caches.push(cache);
        current = output;
    }
    (current, caches)
}

fn lookup<'a>(dict: &'a StateDict, name: &str, shape: &[usize]) -> Result<&'a Tensor> {
    let tensor = dict.get(name).ok_or_else(|| {
        LanderError::shape_mismatch(format!("tensor '{}'", name), "missing".to_string())
    })?;
    let expected_len: usize = shape.iter().product();
    if tensor.shape != shape || tensor.data.len() != expected_len {
        return Err(LanderError::shape_mismatch(
            format!("'{}' with shape {:?}", name, shape),
            format!("shape {:?} with {} values", tensor.shape, tensor.data.len()),
        ));
    }
    Ok(tensor)
}

/// Elementwise `tau * online + (1 - tau) * target`.
pub fn interpolate<D: ndarray::Dimension>(
    online: &ndarray::ArrayView<f32, D>,
    target: &ndarray::ArrayView<f32, D>,
    tau: f32,
) -> ndarray::Array<f32, D> {
    Zip::from(online)
        .and(target)
        .map_collect(|&o, &t| tau * o + (1.0 - tau) * t)
}

fn check_same_shape(target: &QNetwork, online: &QNetwork) -> Result<()> {
    let expected = online.architecture.layer_sizes();
    let actual = target.architecture.layer_sizes();
    if expected != actual {
        return Err(LanderError::shape_mismatch(format!("{:?}", expected), format!("{:?}", actual)));
    }
    Ok(())
}

/// Polyak-average the online parameters into the target network.
pub fn soft_update(target: &mut QNetwork, online: &QNetwork, tau: f32) -> Result<()> {
    check_same_shape(target, online)?;

    for (t, o) in target.layers.iter_mut().zip(&online.layers) {
        let weights = interpolate(&o.weights.view(), &t.weights.view(), tau);
        let biases = interpolate(&o.biases.view(), &t.biases.view(), tau);
        t.weights = weights;
        t.biases = biases;
    }
    Ok(())
}

/// Overwrite the target parameters with the online ones, whatever the target holds.
pub fn hard_update(target: &mut QNetwork, online: &QNetwork) -> Result<()> {
    check_same_shape(target, online)?;
    for (t, o) in target.layers.iter_mut().zip(&online.layers) {
        t.weights.assign(&o.weights);
        t.biases.assign(&o.biases);
    }
    Ok(())
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: ArrayView1<f32>) -> Result<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(LanderError::NumericInstability(format!(
                "non-finite action-value {} at index {}",
                v, i
            )));
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
        .ok_or_else(|| LanderError::shape_mismatch("at least one action-value", "none"))
}
