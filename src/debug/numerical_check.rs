use log::warn;

use crate::network::{Gradients, QNetwork};

/// Types of numerical issues
#[derive(Debug, Clone, PartialEq)]
pub enum NumericalIssue {
    NaN { tensor: String, count: usize },
    Infinity { tensor: String, count: usize },
    Overflow { tensor: String, count: usize },
}

fn scan<'a, I>(tensor: String, values: I, overflow_limit: f32, issues: &mut Vec<NumericalIssue>)
where
    I: IntoIterator<Item = &'a f32>,
{
    let mut nan_count = 0;
    let mut inf_count = 0;
    let mut overflow_count = 0;

    for &value in values {
        if value.is_nan() {
            nan_count += 1;
        } else if value.is_infinite() {
            inf_count += 1;
        } else if value.abs() > overflow_limit {
            overflow_count += 1;
        }
    }

    if nan_count > 0 {
        warn!("{}: found {} NaN values", tensor, nan_count);
        issues.push(NumericalIssue::NaN { tensor: tensor.clone(), count: nan_count });
    }
    if inf_count > 0 {
        warn!("{}: found {} infinite values", tensor, inf_count);
        issues.push(NumericalIssue::Infinity { tensor: tensor.clone(), count: inf_count });
    }
    if overflow_count > 0 {
        warn!("{}: found {} values above {}", tensor, overflow_count, overflow_limit);
        issues.push(NumericalIssue::Overflow { tensor, count: overflow_count });
    }
}

/// Check every parameter tensor of a network
pub fn check_network(network: &QNetwork) -> Vec<NumericalIssue> {
    let mut issues = Vec::new();
    for (i, layer) in network.layers.iter().enumerate() {
        scan(format!("fc{}.weight", i + 1), layer.weights.iter(), 1e38, &mut issues);
        scan(format!("fc{}.bias", i + 1), layer.biases.iter(), 1e38, &mut issues);
    }
    issues
}

/// Check gradients for NaN, infinities and exploding values
pub fn check_gradients(gradients: &Gradients) -> Vec<NumericalIssue> {
    let mut issues = Vec::new();
    for (i, grads) in gradients.iter().enumerate() {
        scan(format!("fc{}.weight.grad", i + 1), grads.weights.iter(), 1e6, &mut issues);
        scan(format!("fc{}.bias.grad", i + 1), grads.biases.iter(), 1e6, &mut issues);
    }
    issues
}
