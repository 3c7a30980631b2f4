//! Feasibility bounds for a single pruning decision
//!
//! Pure functions over a [`Topology`]: given the layer under the cursor, the
//! resources already spent and the width feeding the layer, they compute the
//! range of keep-ratios that still lets the remaining layers land inside the
//! budget window. Nothing here touches episode state.

use crate::architecture::{LayerCosts, PairRole, Topology};
use crate::config::ResourceMetric;
use crate::layers::LayerCost;
use crate::utils::math::clip;

/// Best-case and worst-case cost of the layers still to come.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Lookahead {
    pub min_params: f64,
    pub max_params: f64,
    pub min_flops: f64,
    pub max_flops: f64,
}

impl Lookahead {
    /// Floor-ratio cost under `metric`.
    pub fn min(&self, metric: ResourceMetric) -> f64 {
        match metric {
            ResourceMetric::Params => self.min_params,
            ResourceMetric::Flops => self.min_flops,
        }
    }

    /// Unpruned cost under `metric`.
    pub fn max(&self, metric: ResourceMetric) -> f64 {
        match metric {
            ResourceMetric::Params => self.max_params,
            ResourceMetric::Flops => self.max_flops,
        }
    }

    fn accumulate(&mut self, costs: &LayerCosts) {
        self.min_params += costs.min_params;
        self.max_params += costs.orig_params;
        self.min_flops += costs.min_flops;
        self.max_flops += costs.orig_flops;
    }
}

/// Sums the static costs of every layer after the successor of `cursor`.
///
/// The successor itself is left out: whether its cost depends on the width
/// chosen at `cursor` is decided by [`feasible_interval`].
pub fn lookahead(topology: &Topology, cursor: usize) -> Lookahead {
    let mut acc = Lookahead::default();
    for costs in topology.costs().iter().skip(cursor + 2) {
        acc.accumulate(costs);
    }
    acc
}

/// Range of keep-ratios for the layer under the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeasibleInterval {
    /// Lowest ratio that can still reach the lower budget bound, clipped to `[floor_ratio, 1]`.
    pub min_action: f64,
    /// Highest ratio that still leaves room for the remaining layers, clipped to `[floor_ratio, 1]`.
    pub max_action: f64,
    /// Filter count matching `min_action` before clipping.
    pub raw_min_n: f64,
    /// Filter count matching `max_action` before clipping.
    pub raw_max_n: f64,
}

impl FeasibleInterval {
    /// True when the budget window cannot be met at this step.
    ///
    /// The clipped actions are still usable; the inversion only signals that
    /// the ratio/floor combination is infeasible for the topology.
    pub fn is_inverted(&self) -> bool {
        self.raw_min_n > self.raw_max_n
    }

    /// Clips a proposed action into the interval.
    ///
    /// With `enforce_lower_bound` unset only `max_action` applies and the
    /// result may fall anywhere below it.
    pub fn clip(&self, action: f64, enforce_lower_bound: bool) -> f64 {
        if enforce_lower_bound {
            clip(action, self.min_action, self.max_action)
        } else {
            clip(action, f64::NEG_INFINITY, self.max_action)
        }
    }
}

/// Computes the feasible action interval for the layer at `cursor`.
///
/// # Arguments
///
/// * `topology` - Static chain and budget
/// * `cursor` - Ordinal of the layer being decided
/// * `spent` - Resources already committed, under the topology's metric
/// * `prev_width` - Number of channels feeding the layer
///
/// # Returns
///
/// `None` when `cursor` is the terminal layer, which is never pruned.
pub fn feasible_interval(
    topology: &Topology,
    cursor: usize,
    spent: f64,
    prev_width: usize,
) -> Option<FeasibleInterval> {
    let next = topology.successor(cursor)?;
    let layer = topology.layer(cursor);
    let next_layer = topology.layer(next);
    let metric = topology.metric();
    let budget = topology.budget();

    let mut future = lookahead(topology, cursor);
    let prev = prev_width as f64;
    let area = layer.shape.spatial_area() as f64;
    let next_area = next_layer.shape.spatial_area() as f64;

    let (max_n, min_n) = match layer.role {
        // the width chosen here is also the input width of the successor
        PairRole::StagePairFirst => {
            // the terminal layer is never pruned below its full width
            let next_min_width = if topology.is_terminal(next) {
                next_layer.out_channels() as f64
            } else {
                topology.floor_width(next) as f64
            };
            let next_max_width = next_layer.out_channels() as f64;

            let (max_den, min_den) = match metric {
                ResourceMetric::Params => (prev + next_min_width, prev + next_max_width),
                ResourceMetric::Flops => (
                    prev * area + next_min_width * next_area,
                    prev * area + next_max_width * next_area,
                ),
            };
            (
                (budget.upper_bound - spent - future.min(metric)) * 1e6 / 9.0 / max_den,
                (budget.lower_bound - spent - future.max(metric)) * 1e6 / 9.0 / min_den,
            )
        }
        PairRole::StagePairSecond => {
            future.accumulate(topology.cost(next));

            let den = match metric {
                ResourceMetric::Params => prev,
                ResourceMetric::Flops => prev * area,
            };
            (
                (budget.upper_bound - spent - future.min(metric)) * 1e6 / 9.0 / den,
                (budget.lower_bound - spent - future.max(metric)) * 1e6 / 9.0 / den,
            )
        }
    };

    let orig_width = layer.shape.out_channels() as f64;
    let floor = topology.floor_ratio();

    Some(FeasibleInterval {
        min_action: clip(min_n / orig_width, floor, 1.0),
        max_action: clip(max_n / orig_width, floor, 1.0),
        raw_min_n: min_n,
        raw_max_n: max_n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;

    #[test]
    fn test_lookahead_skips_successor() {
        let config = ProxyConfig::new(vec![2], ResourceMetric::Params, 0.5, 0.5, true);
        let topology = Topology::build(&config).unwrap();
        let ahead = lookahead(&topology, 0);

        let expected: f64 = topology.costs()[2..].iter().map(|c| c.orig_params).sum();
        assert_eq!(ahead.max_params, expected);

        let last = topology.cost(3);
        assert_eq!(
            lookahead(&topology, 1),
            Lookahead {
                min_params: last.min_params,
                max_params: last.orig_params,
                min_flops: last.min_flops,
                max_flops: last.orig_flops,
            }
        );
        assert_eq!(lookahead(&topology, 2), Lookahead::default());
    }

    #[test]
    fn test_terminal_layer_has_no_interval() {
        let config = ProxyConfig::new(vec![1], ResourceMetric::Flops, 0.5, 0.1, true);
        let topology = Topology::build(&config).unwrap();
        assert!(feasible_interval(&topology, 1, 0.0, 16).is_none());
        assert!(feasible_interval(&topology, 0, 0.0, 64).is_some());
    }
}
