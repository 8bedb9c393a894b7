pub mod traits;
pub mod dense;
pub mod initialization;

pub use traits::{Layer as LayerTrait, LayerCache, LayerGradients, Mode};
pub use dense::DenseLayer;
pub use initialization::WeightInit;
