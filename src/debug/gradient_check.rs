use ndarray::{Array2, ArrayView2};

use crate::error::Result;
use crate::loss::{Loss, MSE};
use crate::network::QNetwork;

fn gathered_loss(network: &QNetwork, inputs: ArrayView2<f32>, actions: &[usize], targets: &[f32]) -> Result<f32> {
    let outputs = network.forward_batch(inputs)?;
    let predictions = actions
        .iter()
        .enumerate()
        .map(|(i, &a)| outputs[[i, a]])
        .collect::<ndarray::Array1<f32>>();
    let targets = ndarray::Array1::from_vec(targets.to_vec());
    Ok(MSE.compute(predictions.view(), targets.view()))
}

/// Compare backprop weight gradients against central finite differences.
///
/// The loss is the mean squared error between the value of `actions[i]` in
/// row `i` and `targets[i]`. Returns the largest absolute difference between
/// analytical and numerical gradients over all weight entries.
pub fn gradient_check(
    network: &QNetwork,
    inputs: ArrayView2<f32>,
    actions: &[usize],
    targets: &[f32],
    epsilon: f32,
) -> Result<f32> {
    let (outputs, caches) = network.forward_train(inputs)?;
    let predictions = actions
        .iter()
        .enumerate()
        .map(|(i, &a)| outputs[[i, a]])
        .collect::<ndarray::Array1<f32>>();
    let target_array = ndarray::Array1::from_vec(targets.to_vec());
    let grad = MSE.gradient(predictions.view(), target_array.view());

    let mut output_grad = Array2::zeros(outputs.dim());
    for (i, &a) in actions.iter().enumerate() {
        output_grad[[i, a]] = grad[i];
    }
    let analytical = network.backward(&caches, output_grad.view())?;

    let mut perturbed = network.clone();
    let mut max_error = 0.0f32;
    for (layer_idx, layer_grads) in analytical.iter().enumerate() {
        let (rows, cols) = layer_grads.weights.dim();
        for i in 0..rows {
            for j in 0..cols {
                let original = perturbed.layers[layer_idx].weights[[i, j]];

                perturbed.layers[layer_idx].weights[[i, j]] = original + epsilon;
                let loss_plus = gathered_loss(&perturbed, inputs, actions, targets)?;
                perturbed.layers[layer_idx].weights[[i, j]] = original - epsilon;
                let loss_minus = gathered_loss(&perturbed, inputs, actions, targets)?;
                perturbed.layers[layer_idx].weights[[i, j]] = original;

                let numerical = (loss_plus - loss_minus) / (2.0 * epsilon);
                max_error = max_error.max((numerical - layer_grads.weights[[i, j]]).abs());
            }
        }
    }

    Ok(max_error)
}
