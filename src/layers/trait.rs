//! Resource cost trait for convolution layers
//!
//! This module defines the `LayerCost` trait used to account for the
//! parameters and multiply-accumulate operations of a layer at a given width.

/// Core trait for layers whose resource usage is tracked.
///
/// All costs are exact integer counts; the `*_millions` helpers give the
/// scaled values stored in the resource tables and episode accumulators.
///
/// # Example
///
/// ```ignore
/// let shape = Conv2DShape::new(64, 16, 1, 32);
/// assert_eq!(shape.parameter_count(), 9 * 16 * 64);
/// ```
pub trait LayerCost {
    /// Number of input channels feeding the layer.
    fn in_channels(&self) -> usize;

    /// Number of output channels (filters) produced by the layer.
    fn out_channels(&self) -> usize;

    /// Number of weights in the layer (biases are not tracked).
    fn parameter_count(&self) -> usize;

    /// Number of multiply-accumulate operations for one forward pass.
    fn flop_count(&self) -> usize;

    /// Parameter count in millions.
    fn params_millions(&self) -> f64 {
        self.parameter_count() as f64 / 1e6
    }

    /// Multiply-accumulate count in millions.
    fn flops_millions(&self) -> f64 {
        self.flop_count() as f64 / 1e6
    }
}
