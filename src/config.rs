//! Configuration structures for the pruning environment
//!
//! This module provides the configuration consumed by [`Topology::build`](crate::architecture::Topology::build):
//! the stage layout of the ResNet-style chain, the limiting resource metric and
//! the budget/floor ratios. Configurations can be written in code, taken from a
//! preset, or loaded from JSON files.

use crate::architecture::BASE_STAGE_WIDTH;
use crate::error::{ProxyError, Result};
use crate::layers::conv2d::KERNEL_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;

/// Resource type whose budget limits the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMetric {
    /// Total parameter count (reported in millions).
    #[serde(alias = "para")]
    Params,
    /// Total multiply-accumulate operations (reported in millions).
    Flops,
}

impl fmt::Display for ResourceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceMetric::Params => write!(f, "params"),
            ResourceMetric::Flops => write!(f, "flops"),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_expand_ratio() -> usize {
    1
}

fn default_stem_channels() -> usize {
    64
}

fn default_input_resolution() -> usize {
    32
}

fn default_budget_margin() -> f64 {
    0.05
}

/// Configuration for a pruning environment.
///
/// Only `unit_counts`, `metric`, `ratio` and `floor_ratio` are required; the
/// remaining fields fall back to the CIFAR ResNet defaults.
///
/// # Example
///
/// ```json
/// {
///   "unit_counts": [3, 3, 3],
///   "metric": "flops",
///   "ratio": 0.5,
///   "floor_ratio": 0.1,
///   "enforce_lower_bound": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Number of residual units per stage. Each unit contributes two conv layers.
    pub unit_counts: Vec<usize>,

    /// Resource whose budget is enforced.
    pub metric: ResourceMetric,

    /// Target retention of the selected resource, in (0, 1].
    pub ratio: f64,

    /// Minimum fraction of a layer's original width any decision may keep, in (0, 1].
    pub floor_ratio: f64,

    /// Clip proposals against the lower feasibility bound as well as the upper one.
    #[serde(default = "default_true")]
    pub enforce_lower_bound: bool,

    /// Multiplier on the base stage width of 16 channels.
    #[serde(default = "default_expand_ratio")]
    pub expand_ratio: usize,

    /// Output width of the stem convolution feeding the first stage.
    #[serde(default = "default_stem_channels")]
    pub stem_channels: usize,

    /// Edge length of the input feature map.
    #[serde(default = "default_input_resolution")]
    pub input_resolution: usize,

    /// Width of the budget window: `lower_bound = total * (ratio - budget_margin)`.
    #[serde(default = "default_budget_margin")]
    pub budget_margin: f64,
}

impl ProxyConfig {
    /// Creates a configuration with default stem, resolution and margin.
    pub fn new(
        unit_counts: Vec<usize>,
        metric: ResourceMetric,
        ratio: f64,
        floor_ratio: f64,
        enforce_lower_bound: bool,
    ) -> Self {
        Self {
            unit_counts,
            metric,
            ratio,
            floor_ratio,
            enforce_lower_bound,
            expand_ratio: default_expand_ratio(),
            stem_channels: default_stem_channels(),
            input_resolution: default_input_resolution(),
            budget_margin: default_budget_margin(),
        }
    }

    /// ResNet-20 layout: three stages of three units at widths 16/32/64.
    pub fn resnet20(
        metric: ResourceMetric,
        ratio: f64,
        floor_ratio: f64,
        enforce_lower_bound: bool,
    ) -> Self {
        Self::new(vec![3, 3, 3], metric, ratio, floor_ratio, enforce_lower_bound)
    }

    /// ResNet-56 proxy layout: four stages of 3/4/6/3 units, widths expanded by 4.
    pub fn resnet56(
        metric: ResourceMetric,
        ratio: f64,
        floor_ratio: f64,
        enforce_lower_bound: bool,
    ) -> Self {
        Self {
            expand_ratio: 4,
            ..Self::new(
                vec![3, 4, 6, 3],
                metric,
                ratio,
                floor_ratio,
                enforce_lower_bound,
            )
        }
    }

    /// Checks the configuration, see [`validate_config`].
    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }
}

/// Loads an environment configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it into a `ProxyConfig` and
/// validates it.
///
/// # Returns
///
/// `Ok(ProxyConfig)` on success, or an error if the file cannot be read, the
/// JSON is invalid, or the values fail validation.
///
/// # Examples
///
/// ```no_run
/// use resnet_prune_env::config::load_config;
///
/// let cfg = load_config("config/resnet20_flops.json").unwrap();
/// assert_eq!(cfg.unit_counts, vec![3, 3, 3]);
/// ```
pub fn load_config(path: &str) -> Result<ProxyConfig> {
    let contents = fs::read_to_string(path)?;
    let config: ProxyConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates an environment configuration.
///
/// Checks that:
/// - There is at least one stage and every stage has at least one unit
/// - `ratio` and `floor_ratio` are in (0, 1]
/// - Width and resolution parameters are positive
/// - The budget window is not negative (`ratio - budget_margin >= 0`)
/// - The input resolution halves cleanly at every downsampling stage
/// - The operation count of the widest layer fits in a `usize`
///
/// # Errors
///
/// Returns `ProxyError::InvalidConfig` with a descriptive message.
pub fn validate_config(config: &ProxyConfig) -> Result<()> {
    if config.unit_counts.is_empty() {
        return Err(invalid("unit_counts must contain at least one stage"));
    }

    if let Some(stage) = config.unit_counts.iter().position(|&units| units == 0) {
        return Err(invalid(format!(
            "Stage {}: unit count must be greater than 0",
            stage
        )));
    }

    if !(config.ratio > 0.0 && config.ratio <= 1.0) {
        return Err(invalid(format!(
            "ratio must be in range (0.0, 1.0], got {}",
            config.ratio
        )));
    }

    if !(config.floor_ratio > 0.0 && config.floor_ratio <= 1.0) {
        return Err(invalid(format!(
            "floor_ratio must be in range (0.0, 1.0], got {}",
            config.floor_ratio
        )));
    }

    if config.expand_ratio == 0 {
        return Err(invalid("expand_ratio must be greater than 0"));
    }

    if config.stem_channels == 0 {
        return Err(invalid("stem_channels must be greater than 0"));
    }

    if config.input_resolution == 0 {
        return Err(invalid("input_resolution must be greater than 0"));
    }

    if !(config.budget_margin >= 0.0) {
        return Err(invalid("budget_margin must be non-negative"));
    }

    if config.ratio - config.budget_margin < 0.0 {
        return Err(invalid(format!(
            "budget window is negative: ratio {} minus margin {} is below zero",
            config.ratio, config.budget_margin
        )));
    }

    // every stage after the first halves the feature map once
    let downsamples = config.unit_counts.len() - 1;
    let divisor = u32::try_from(downsamples)
        .ok()
        .and_then(|shift| 1usize.checked_shl(shift))
        .unwrap_or(0);
    if divisor == 0 || config.input_resolution % divisor != 0 {
        return Err(invalid(format!(
            "input_resolution {} cannot be halved {} times",
            config.input_resolution, downsamples
        )));
    }

    // no layer is wider, has more inputs or a larger feature map than this one
    let widest_layer_flops = BASE_STAGE_WIDTH
        .checked_mul(config.expand_ratio)
        .and_then(|width| width.checked_mul(divisor))
        .and_then(|width| {
            width
                .checked_mul(width.max(config.stem_channels))?
                .checked_mul(KERNEL_SIZE * KERNEL_SIZE)?
                .checked_mul(config.input_resolution)?
                .checked_mul(config.input_resolution)
        });
    if widest_layer_flops.is_none() {
        return Err(invalid(format!(
            "layer costs overflow: expand_ratio {}, stem_channels {}, input_resolution {}",
            config.expand_ratio, config.stem_channels, config.input_resolution
        )));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ProxyError {
    ProxyError::InvalidConfig(message.into())
}
