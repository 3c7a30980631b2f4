//! Layer abstractions for resource accounting
//!
//! This module provides the `LayerCost` trait and the 3×3 convolution shape
//! every layer of the chain is built from.

mod r#trait;
pub mod conv2d;

// Re-export the cost trait for convenience
pub use r#trait::LayerCost;
pub use conv2d::Conv2DShape;
