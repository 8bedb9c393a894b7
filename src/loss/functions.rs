use ndarray::{Array1, ArrayView1};

/// Trait defining the interface for loss functions
pub trait Loss: Send + Sync {
    /// Loss of a batch of predictions against constant targets
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32;

    /// Gradient of the loss with respect to each prediction
    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32>;
}

/// Mean Squared Error: `mean((p - t)^2)`
#[derive(Debug, Clone, Copy, Default)]
pub struct MSE;

impl Loss for MSE {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        if predictions.is_empty() {
            return 0.0;
        }
        let diff = &predictions - &targets;
        diff.mapv(|d| d * d).sum() / predictions.len() as f32
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        let n = predictions.len().max(1) as f32;
        (&predictions - &targets) * (2.0 / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse_value_and_gradient() {
        let p = array![1.0, 2.0, 3.0, 4.0];
        let t = array![1.0, 1.0, 1.0, 1.0];
        let loss = MSE.compute(p.view(), t.view());
        assert!((loss - 3.5).abs() < 1e-6);

        let grad = MSE.gradient(p.view(), t.view());
        assert_eq!(grad, array![0.0, 0.5, 1.0, 1.5]);
    }
}
