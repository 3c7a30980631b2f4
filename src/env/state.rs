//! Observations, step results and trajectory snapshots

use crate::architecture::Topology;
use crate::config::ResourceMetric;
use crate::env::bounds::FeasibleInterval;
use serde::Serialize;

/// Normalized features describing the layer about to be decided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    /// Chain position divided by `chain_length - 1`.
    pub layer_position: f64,
    /// Original output width over the widest layer.
    pub out_channels: f64,
    /// Original input width over the widest layer.
    pub in_channels: f64,
    /// Feature map edge over the input resolution.
    pub spatial_size: f64,
    /// Resources committed so far over the upper budget bound.
    pub spent: f64,
    /// Original cost of this layer over the costliest layer.
    pub layer_cost: f64,
}

impl Observation {
    /// Features of the layer at `ordinal` after `spent` of the metric is committed.
    pub fn for_layer(topology: &Topology, ordinal: usize, spent: f64) -> Self {
        let layer = topology.layer(ordinal);
        let metric = topology.metric();
        let max_channels = topology.max_out_channels() as f64;
        let span = topology.len().saturating_sub(1).max(1) as f64;

        Self {
            layer_position: ordinal as f64 / span,
            out_channels: layer.out_channels() as f64 / max_channels,
            in_channels: layer.in_channels() as f64 / max_channels,
            spatial_size: layer.spatial_size() as f64 / topology.reference_spatial_size() as f64,
            spent: spent / topology.upper_bound(),
            layer_cost: topology.cost(ordinal).orig(metric) / topology.max_layer_cost(metric),
        }
    }

    /// Features in the fixed order a policy network consumes them.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.layer_position,
            self.out_channels,
            self.in_channels,
            self.spatial_size,
            self.spent,
            self.layer_cost,
        ]
    }
}

/// Result of one `compress` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Features of the next layer. Once `done`, the last emitted observation is repeated.
    pub observation: Observation,
    /// Action actually applied after clipping.
    pub action: f64,
    /// Filter count committed for the decided layer.
    pub filters: usize,
    /// True once the cursor reached the terminal layer.
    pub done: bool,
    /// Interval the proposal was clipped into.
    pub interval: FeasibleInterval,
}

impl StepOutcome {
    /// True when the budget window could not be met at this step.
    pub fn window_inverted(&self) -> bool {
        self.interval.is_inverted()
    }
}

/// Snapshot of an episode for external reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub metric: ResourceMetric,
    /// Names of the layers decided so far, in order.
    pub layers: Vec<String>,
    pub observations: Vec<Observation>,
    pub actions: Vec<f64>,
    /// Committed widths, starting with the stem width.
    pub filter_counts: Vec<usize>,
    /// Incremental parameter cost per step, in millions.
    pub step_params: Vec<f64>,
    /// Incremental operation cost per step, in millions.
    pub step_flops: Vec<f64>,
    /// Unpruned parameter total, in millions.
    pub total_params: f64,
    /// Unpruned operation total, in millions.
    pub total_flops: f64,
    pub spent_params: f64,
    pub spent_flops: f64,
    /// `spent_params` over the unpruned total.
    pub params_ratio: f64,
    /// `spent_flops` over the unpruned total.
    pub flops_ratio: f64,
    pub done: bool,
}
