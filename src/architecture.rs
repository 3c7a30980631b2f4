//! Topology model of the ResNet-style conv chain
//!
//! This module builds, once per configuration, the ordered chain of 3×3 conv
//! layers together with their static resource tables: the original cost of
//! every layer, its theoretical minimum cost when pruned to the floor ratio,
//! the global totals and the budget window for the limiting metric.
//!
//! The chain is stored as an ordered `Vec` of descriptors; a layer's
//! successor is simply the next entry, and a side map resolves names to
//! positions. Skip connections are not tracked.

use crate::config::{validate_config, ProxyConfig, ResourceMetric};
use crate::error::Result;
use crate::layers::{Conv2DShape, LayerCost};
use crate::utils::math::scaled_width;
use std::collections::HashMap;
use tracing::debug;

/// Name of the fixed stem convolution that feeds the first stage.
pub const STEM_NAME: &str = "conv0";

/// Width of the first stage before `expand_ratio` is applied.
pub const BASE_STAGE_WIDTH: usize = 16;

/// Position of a layer inside its residual unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairRole {
    /// First conv of a unit. Its width is also the input width of the second conv.
    StagePairFirst,
    /// Second conv of a unit. Its input width is set by the first conv.
    StagePairSecond,
}

impl PairRole {
    /// Slot number used in layer names (`conv{unit}_{slot}`).
    pub fn slot(self) -> usize {
        match self {
            PairRole::StagePairFirst => 0,
            PairRole::StagePairSecond => 1,
        }
    }
}

/// Immutable description of one conv layer in the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    /// Unique name, `conv{unit}_{slot}`.
    pub name: String,
    /// Position in the chain, starting at 0 for the first non-stem layer.
    pub ordinal: usize,
    /// Stage the layer belongs to.
    pub stage: usize,
    /// Residual unit index, counted across all stages.
    pub unit: usize,
    /// Whether this is the first or second conv of its unit.
    pub role: PairRole,
    /// Unpruned geometry.
    pub shape: Conv2DShape,
}

impl LayerDescriptor {
    /// Original number of filters.
    pub fn out_channels(&self) -> usize {
        self.shape.out_channels()
    }

    /// Original number of input channels.
    pub fn in_channels(&self) -> usize {
        self.shape.in_channels()
    }

    /// Edge length of the output feature map.
    pub fn spatial_size(&self) -> usize {
        self.shape.spatial_size()
    }

    pub fn stride(&self) -> usize {
        self.shape.stride()
    }

    /// `(unit, slot)` pair as used in layer names.
    pub fn index(&self) -> (usize, usize) {
        (self.unit, self.role.slot())
    }
}

/// Static per-layer resource costs, in millions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerCosts {
    pub orig_params: f64,
    pub orig_flops: f64,
    pub min_params: f64,
    pub min_flops: f64,
}

impl LayerCosts {
    /// Original cost under `metric`.
    pub fn orig(&self, metric: ResourceMetric) -> f64 {
        match metric {
            ResourceMetric::Params => self.orig_params,
            ResourceMetric::Flops => self.orig_flops,
        }
    }

    /// Floor-ratio cost under `metric`.
    pub fn min(&self, metric: ResourceMetric) -> f64 {
        match metric {
            ResourceMetric::Params => self.min_params,
            ResourceMetric::Flops => self.min_flops,
        }
    }
}

/// Budget window for the limiting metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Budget {
    pub metric: ResourceMetric,
    /// Unpruned total of the metric over the whole chain.
    pub total: f64,
    pub upper_bound: f64,
    pub lower_bound: f64,
}

/// The chain of conv layers with its static resource tables.
///
/// Built once by [`Topology::build`] and never mutated afterwards, so it can
/// be shared read-only between any number of episodes.
///
/// # Example
///
/// ```
/// use resnet_prune_env::architecture::Topology;
/// use resnet_prune_env::config::{ProxyConfig, ResourceMetric};
///
/// let config = ProxyConfig::resnet20(ResourceMetric::Flops, 0.5, 0.1, false);
/// let topology = Topology::build(&config).unwrap();
/// assert_eq!(topology.len(), 18);
/// assert_eq!(topology.layer(0).name, "conv0_0");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    config: ProxyConfig,
    layers: Vec<LayerDescriptor>,
    costs: Vec<LayerCosts>,
    name_to_ordinal: HashMap<String, usize>,
    total_params: f64,
    total_flops: f64,
    budget: Budget,
    max_out_channels: usize,
    max_layer_params: f64,
    max_layer_flops: f64,
}

impl Topology {
    /// Builds the chain and its resource tables from a configuration.
    ///
    /// Stage `i` contributes `unit_counts[i]` units of two layers at width
    /// `16 * expand_ratio * 2^i`. The first layer of every stage after the
    /// first has stride 2 and halves the feature map.
    ///
    /// Minimum costs assume every layer is pruned to `floor_ratio`. The first
    /// layer of a unit reads the unpruned width of the previous unit, and the
    /// last layer of the chain keeps its full output width.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::InvalidConfig` if the configuration fails
    /// [`validate_config`].
    pub fn build(config: &ProxyConfig) -> Result<Self> {
        validate_config(config)?;

        let floor = config.floor_ratio;
        let mut layers = Vec::new();
        let mut costs = Vec::new();
        let mut last_n = config.stem_channels;
        let mut fsize = config.input_resolution;
        let mut unit = 0;

        for (stage, &units) in config.unit_counts.iter().enumerate() {
            let width = BASE_STAGE_WIDTH * config.expand_ratio * (1 << stage);

            for unit_in_stage in 0..units {
                let stride = if unit_in_stage == 0 && stage > 0 { 2 } else { 1 };
                if stride != 1 {
                    fsize /= 2;
                }

                let mut last_min_n = last_n;
                for role in [PairRole::StagePairFirst, PairRole::StagePairSecond] {
                    let layer_stride = match role {
                        PairRole::StagePairFirst => stride,
                        PairRole::StagePairSecond => 1,
                    };
                    let shape = Conv2DShape::new(last_n, width, layer_stride, fsize);
                    let min_n = scaled_width(width, floor);
                    let min_shape = shape.with_channels(last_min_n, min_n);

                    let ordinal = layers.len();
                    layers.push(LayerDescriptor {
                        name: format!("conv{}_{}", unit, role.slot()),
                        ordinal,
                        stage,
                        unit,
                        role,
                        shape,
                    });
                    costs.push(LayerCosts {
                        orig_params: shape.params_millions(),
                        orig_flops: shape.flops_millions(),
                        min_params: min_shape.params_millions(),
                        min_flops: min_shape.flops_millions(),
                    });

                    last_n = width;
                    last_min_n = min_n;
                }
                unit += 1;
            }
        }

        // the last conv layer keeps its output width; only its input shrinks
        if let (Some(last), Some(last_costs)) = (layers.last(), costs.last_mut()) {
            let min_shape = last
                .shape
                .with_channels(scaled_width(last.in_channels(), floor), last.out_channels());
            last_costs.min_params = min_shape.params_millions();
            last_costs.min_flops = min_shape.flops_millions();
        }

        let name_to_ordinal = layers
            .iter()
            .map(|layer| (layer.name.clone(), layer.ordinal))
            .collect();

        let total_params: f64 = costs.iter().map(|c| c.orig_params).sum();
        let total_flops: f64 = costs.iter().map(|c| c.orig_flops).sum();
        let total = match config.metric {
            ResourceMetric::Params => total_params,
            ResourceMetric::Flops => total_flops,
        };
        let budget = Budget {
            metric: config.metric,
            total,
            upper_bound: total * config.ratio,
            lower_bound: total * (config.ratio - config.budget_margin),
        };

        let max_out_channels = layers
            .iter()
            .map(LayerDescriptor::out_channels)
            .max()
            .unwrap_or(0);
        let max_layer_params = costs.iter().map(|c| c.orig_params).fold(0.0, f64::max);
        let max_layer_flops = costs.iter().map(|c| c.orig_flops).fold(0.0, f64::max);

        debug!(
            layers = layers.len(),
            total_params,
            total_flops,
            metric = %config.metric,
            upper_bound = budget.upper_bound,
            lower_bound = budget.lower_bound,
            "built pruning topology"
        );

        Ok(Self {
            config: config.clone(),
            layers,
            costs,
            name_to_ordinal,
            total_params,
            total_flops,
            budget,
            max_out_channels,
            max_layer_params,
            max_layer_flops,
        })
    }

    /// Configuration the topology was built from.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Limiting resource metric.
    pub fn metric(&self) -> ResourceMetric {
        self.config.metric
    }

    pub fn floor_ratio(&self) -> f64 {
        self.config.floor_ratio
    }

    /// Output width of the stem convolution.
    pub fn stem_channels(&self) -> usize {
        self.config.stem_channels
    }

    /// Edge length of the input feature map, used to normalize spatial sizes.
    pub fn reference_spatial_size(&self) -> usize {
        self.config.input_resolution
    }

    /// Number of layers in the chain (the stem is not counted).
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always false for a built topology; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer descriptors in chain order.
    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    /// Descriptor at `ordinal`.
    ///
    /// # Panics
    ///
    /// Panics if `ordinal >= self.len()`.
    pub fn layer(&self, ordinal: usize) -> &LayerDescriptor {
        &self.layers[ordinal]
    }

    /// Layer names in chain order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| layer.name.as_str())
    }

    /// Position of the layer called `name`.
    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.name_to_ordinal.get(name).copied()
    }

    /// Descriptor of the layer called `name`.
    pub fn layer_by_name(&self, name: &str) -> Option<&LayerDescriptor> {
        self.ordinal_of(name).map(|ordinal| &self.layers[ordinal])
    }

    /// Position of the layer following `ordinal`, `None` for the terminal layer.
    pub fn successor(&self, ordinal: usize) -> Option<usize> {
        let next = ordinal + 1;
        (next < self.layers.len()).then_some(next)
    }

    /// Name of the layer following `name`.
    ///
    /// The stem maps to the first layer of the chain; the terminal layer has
    /// no successor.
    pub fn successor_name(&self, name: &str) -> Option<&str> {
        if name == STEM_NAME {
            return self.layers.first().map(|layer| layer.name.as_str());
        }
        self.ordinal_of(name)
            .and_then(|ordinal| self.successor(ordinal))
            .map(|next| self.layers[next].name.as_str())
    }

    /// True when `ordinal` is the last layer of the chain.
    pub fn is_terminal(&self, ordinal: usize) -> bool {
        self.successor(ordinal).is_none()
    }

    /// Resource costs in chain order, aligned with [`Topology::layers`].
    pub fn costs(&self) -> &[LayerCosts] {
        &self.costs
    }

    /// Resource costs of the layer at `ordinal`.
    pub fn cost(&self, ordinal: usize) -> &LayerCosts {
        &self.costs[ordinal]
    }

    /// Width of the layer at `ordinal` when pruned to the floor ratio.
    pub fn floor_width(&self, ordinal: usize) -> usize {
        scaled_width(self.layers[ordinal].out_channels(), self.config.floor_ratio)
    }

    pub fn total_params(&self) -> f64 {
        self.total_params
    }

    pub fn total_flops(&self) -> f64 {
        self.total_flops
    }

    /// Unpruned total under `metric`.
    pub fn total(&self, metric: ResourceMetric) -> f64 {
        match metric {
            ResourceMetric::Params => self.total_params,
            ResourceMetric::Flops => self.total_flops,
        }
    }

    /// Sum of the floor-ratio costs under `metric`.
    pub fn total_min(&self, metric: ResourceMetric) -> f64 {
        self.costs.iter().map(|c| c.min(metric)).sum()
    }

    /// Budget window for the configured metric.
    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn upper_bound(&self) -> f64 {
        self.budget.upper_bound
    }

    pub fn lower_bound(&self) -> f64 {
        self.budget.lower_bound
    }

    /// Largest original output width over the chain.
    pub fn max_out_channels(&self) -> usize {
        self.max_out_channels
    }

    pub fn max_layer_params(&self) -> f64 {
        self.max_layer_params
    }

    pub fn max_layer_flops(&self) -> f64 {
        self.max_layer_flops
    }

    /// Largest single-layer original cost under `metric`.
    pub fn max_layer_cost(&self, metric: ResourceMetric) -> f64 {
        match metric {
            ResourceMetric::Params => self.max_layer_params,
            ResourceMetric::Flops => self.max_layer_flops,
        }
    }
}
