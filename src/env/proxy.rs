//! Episode state machine over a ResNet-style conv chain
//!
//! `ResNetProxy` walks the chain one layer per `compress` call. At every step
//! it computes the feasible action interval for the current layer, clips the
//! proposed action into it, commits the resulting width and advances. The
//! terminal layer is never decided; its cost is booked when the episode ends.

use crate::architecture::{PairRole, Topology};
use crate::config::{ProxyConfig, ResourceMetric};
use crate::env::bounds::feasible_interval;
use crate::env::state::{Observation, StepOutcome, Trajectory};
use crate::env::Environment;
use crate::error::{ProxyError, Result};
use crate::layers::LayerCost;
use crate::utils::math::round_half_even;
use std::sync::Arc;
use tracing::{debug, warn};

/// Mutable state of one episode.
#[derive(Debug, Clone, Default)]
struct EpisodeState {
    cursor: usize,
    filters: Vec<usize>,
    params: Vec<f64>,
    flops: Vec<f64>,
    actions: Vec<f64>,
    observations: Vec<Observation>,
    done: bool,
}

impl EpisodeState {
    fn spent(&self, metric: ResourceMetric) -> f64 {
        match metric {
            ResourceMetric::Params => self.params.iter().sum(),
            ResourceMetric::Flops => self.flops.iter().sum(),
        }
    }
}

/// Channel pruning environment for a ResNet-style chain.
///
/// The topology is shared through an `Arc`; each proxy owns the state of a
/// single episode, driven by one caller in order.
///
/// # Example
///
/// ```
/// use resnet_prune_env::config::ResourceMetric;
/// use resnet_prune_env::env::{Environment, ResNetProxy};
///
/// let mut env = ResNetProxy::resnet20(ResourceMetric::Flops, 0.5, 0.1, false).unwrap();
/// let (_, _, mut done) = env.init_episode();
/// while !done {
///     done = env.compress(1.0).unwrap().done;
/// }
/// assert!(env.spent_flops() <= env.topology().upper_bound() * 1.001);
/// ```
#[derive(Debug, Clone)]
pub struct ResNetProxy {
    topology: Arc<Topology>,
    enforce_lower_bound: bool,
    state: Option<EpisodeState>,
}

impl ResNetProxy {
    /// Builds the topology for `config` and wraps it in a fresh environment.
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let topology = Topology::build(config)?;
        Ok(Self::from_topology(Arc::new(topology)))
    }

    /// Creates an environment over an existing, possibly shared, topology.
    pub fn from_topology(topology: Arc<Topology>) -> Self {
        let enforce_lower_bound = topology.config().enforce_lower_bound;
        Self {
            topology,
            enforce_lower_bound,
            state: None,
        }
    }

    /// ResNet-20 environment, see [`ProxyConfig::resnet20`].
    pub fn resnet20(
        metric: ResourceMetric,
        ratio: f64,
        floor_ratio: f64,
        enforce_lower_bound: bool,
    ) -> Result<Self> {
        Self::new(&ProxyConfig::resnet20(
            metric,
            ratio,
            floor_ratio,
            enforce_lower_bound,
        ))
    }

    /// ResNet-56 proxy environment, see [`ProxyConfig::resnet56`].
    pub fn resnet56(
        metric: ResourceMetric,
        ratio: f64,
        floor_ratio: f64,
        enforce_lower_bound: bool,
    ) -> Result<Self> {
        Self::new(&ProxyConfig::resnet56(
            metric,
            ratio,
            floor_ratio,
            enforce_lower_bound,
        ))
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn enforces_lower_bound(&self) -> bool {
        self.enforce_lower_bound
    }

    /// Layer under the cursor, `None` before the first `init_episode`.
    pub fn current_layer(&self) -> Option<&str> {
        self.state
            .as_ref()
            .map(|state| self.topology.layer(state.cursor).name.as_str())
    }

    /// Committed widths, starting with the stem width.
    pub fn filter_counts(&self) -> &[usize] {
        match &self.state {
            Some(state) => &state.filters,
            None => &[],
        }
    }

    /// Clipped actions applied so far.
    pub fn actions(&self) -> &[f64] {
        match &self.state {
            Some(state) => &state.actions,
            None => &[],
        }
    }

    /// Observations emitted so far, starting with the initial one.
    pub fn observations(&self) -> &[Observation] {
        match &self.state {
            Some(state) => &state.observations,
            None => &[],
        }
    }

    /// Incremental parameter cost of each committed step, in millions.
    pub fn committed_params(&self) -> &[f64] {
        match &self.state {
            Some(state) => &state.params,
            None => &[],
        }
    }

    /// Incremental operation cost of each committed step, in millions.
    pub fn committed_flops(&self) -> &[f64] {
        match &self.state {
            Some(state) => &state.flops,
            None => &[],
        }
    }

    pub fn spent_params(&self) -> f64 {
        self.committed_params().iter().sum()
    }

    pub fn spent_flops(&self) -> f64 {
        self.committed_flops().iter().sum()
    }

    /// Snapshot of the current episode, `None` before `init_episode`.
    pub fn trajectory(&self) -> Option<Trajectory> {
        let state = self.state.as_ref()?;
        let spent_params = self.spent_params();
        let spent_flops = self.spent_flops();

        Some(Trajectory {
            metric: self.topology.metric(),
            layers: self
                .topology
                .names()
                .take(state.actions.len())
                .map(str::to_owned)
                .collect(),
            observations: state.observations.clone(),
            actions: state.actions.clone(),
            filter_counts: state.filters.clone(),
            step_params: state.params.clone(),
            step_flops: state.flops.clone(),
            total_params: self.topology.total_params(),
            total_flops: self.topology.total_flops(),
            spent_params,
            spent_flops,
            params_ratio: spent_params / self.topology.total_params(),
            flops_ratio: spent_flops / self.topology.total_flops(),
            done: state.done,
        })
    }
}

impl Environment for ResNetProxy {
    fn init_episode(&mut self) -> (Observation, f64, bool) {
        let observation = Observation::for_layer(&self.topology, 0, 0.0);
        self.state = Some(EpisodeState {
            cursor: 0,
            filters: vec![self.topology.stem_channels()],
            observations: vec![observation],
            ..EpisodeState::default()
        });

        (observation, 0.0, self.topology.is_terminal(0))
    }

    fn compress(&mut self, action: f64) -> Result<StepOutcome> {
        if !action.is_finite() {
            return Err(ProxyError::ActionOutOfDomain(action));
        }

        let topology = &self.topology;
        let state = self.state.as_mut().ok_or(ProxyError::EpisodeNotStarted)?;
        if state.done {
            return Err(ProxyError::EpisodeFinished);
        }

        let cursor = state.cursor;
        let layer = topology.layer(cursor);
        let metric = topology.metric();

        // the first conv of a unit reads the unpruned output of the previous unit
        let prev_width = match layer.role {
            PairRole::StagePairFirst => layer.in_channels(),
            PairRole::StagePairSecond => state
                .filters
                .last()
                .copied()
                .unwrap_or_else(|| layer.in_channels()),
        };

        let interval = feasible_interval(topology, cursor, state.spent(metric), prev_width)
            .ok_or(ProxyError::EpisodeFinished)?;
        if interval.is_inverted() {
            warn!(
                layer = %layer.name,
                raw_min_n = interval.raw_min_n,
                raw_max_n = interval.raw_max_n,
                "feasibility window inverted; budget window unreachable at floor ratio"
            );
        }

        let clipped = interval.clip(action, self.enforce_lower_bound);
        let filters = round_half_even(clipped * layer.out_channels() as f64).max(1.0) as usize;

        let committed = layer.shape.with_channels(prev_width, filters);
        state.actions.push(clipped);
        state.filters.push(filters);
        state.params.push(committed.params_millions());
        state.flops.push(committed.flops_millions());

        let next = topology
            .successor(cursor)
            .ok_or(ProxyError::EpisodeFinished)?;
        state.cursor = next;
        let done = topology.is_terminal(next);

        if done {
            // book the terminal layer, fed by the width just committed
            let terminal = topology.layer(next);
            let booked = terminal
                .shape
                .with_channels(filters, terminal.out_channels());
            state.params.push(booked.params_millions());
            state.flops.push(booked.flops_millions());
            state.done = true;
        } else {
            let observation = Observation::for_layer(topology, next, state.spent(metric));
            state.observations.push(observation);
        }

        debug!(
            layer = %layer.name,
            prev_width,
            filters,
            action = clipped,
            proposed = action,
            done,
            "committed layer width"
        );

        let observation = match state.observations.last() {
            Some(observation) => *observation,
            None => Observation::for_layer(topology, next, state.spent(metric)),
        };

        Ok(StepOutcome {
            observation,
            action: clipped,
            filters,
            done,
            interval,
        })
    }

    fn is_done(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.done)
    }
}
