pub mod tracker;
pub mod window;

pub use tracker::{MetricsTracker, TrainingMetrics};
pub use window::ScoreWindow;
