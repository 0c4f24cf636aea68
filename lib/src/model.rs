pub mod layer;
pub mod loss;
pub mod network;

pub use layer::{Activation, Layer, LayerGradients};
pub use loss::{mse, mse_gradient};
pub use network::{ComplementNet, LAYER_WIDTHS};
