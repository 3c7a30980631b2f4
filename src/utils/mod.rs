//! Shared utilities for the pruning environment
//!
//! This module provides the numeric helpers (rounding and clipping rules),
//! a seeded random number generator and tracing setup.

pub mod logging;
pub mod math;
pub mod rng;

pub use math::{clip, round_half_even, scaled_width};
pub use rng::SimpleRng;
