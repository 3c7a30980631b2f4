//! 3×3 convolution shape used for resource accounting
//!
//! This module provides `Conv2DShape`, the geometry of a single conv layer in
//! the chain. It carries no weights: only the quantities needed to count
//! parameters and operations at any candidate width.

use crate::layers::LayerCost;

/// Kernel edge length of every conv layer in the chain.
pub const KERNEL_SIZE: usize = 3;

/// Zero-padding of every conv layer in the chain.
pub const PADDING: usize = 1;

/// Geometry of a 3×3 convolution with padding 1.
///
/// # Fields
///
/// * `in_channels` - Number of input channels
/// * `out_channels` - Number of output feature maps (number of filters)
/// * `stride` - Stride of the convolution (1 or 2)
/// * `spatial_size` - Edge length of the output feature map
///
/// # Example
///
/// ```
/// use resnet_prune_env::layers::{Conv2DShape, LayerCost};
///
/// // 64 input channels, 16 filters, stride 1, 32x32 output
/// let shape = Conv2DShape::new(64, 16, 1, 32);
/// assert_eq!(shape.parameter_count(), 9 * 16 * 64);
/// assert_eq!(shape.flop_count(), 9 * 16 * 64 * 32 * 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2DShape {
    in_channels: usize,
    out_channels: usize,
    stride: usize,
    spatial_size: usize,
}

impl Conv2DShape {
    /// Create a new shape.
    ///
    /// # Arguments
    ///
    /// * `in_channels` - Number of input channels
    /// * `out_channels` - Number of filters
    /// * `stride` - Convolution stride
    /// * `spatial_size` - Output feature map edge length
    pub fn new(in_channels: usize, out_channels: usize, stride: usize, spatial_size: usize) -> Self {
        Self {
            in_channels,
            out_channels,
            stride,
            spatial_size,
        }
    }

    /// Same geometry with different channel counts.
    pub fn with_channels(&self, in_channels: usize, out_channels: usize) -> Self {
        Self {
            in_channels,
            out_channels,
            ..*self
        }
    }

    /// Get the kernel size (always 3).
    pub fn kernel_size(&self) -> usize {
        KERNEL_SIZE
    }

    /// Get the padding (always 1).
    pub fn padding(&self) -> usize {
        PADDING
    }

    /// Get the stride.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Get the output feature map edge length.
    pub fn spatial_size(&self) -> usize {
        self.spatial_size
    }

    /// Number of output pixels per channel.
    pub fn spatial_area(&self) -> usize {
        self.spatial_size * self.spatial_size
    }
}

impl LayerCost for Conv2DShape {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn out_channels(&self) -> usize {
        self.out_channels
    }

    fn parameter_count(&self) -> usize {
        KERNEL_SIZE * KERNEL_SIZE * self.out_channels * self.in_channels
    }

    fn flop_count(&self) -> usize {
        self.parameter_count() * self.spatial_area()
    }
}
