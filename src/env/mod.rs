//! Sequential pruning environment
//!
//! This module provides the `Environment` trait a policy loop drives, and the
//! `ResNetProxy` implementation over a ResNet-style conv chain.
//!
//! # Overview
//!
//! A policy calls `init_episode` once, then `compress` with a keep-ratio in
//! `[0, 1]` for every layer until `done` is reported. The environment may
//! override the proposal: the returned `action` and `filters` are what was
//! actually applied.
//!
//! # Example
//!
//! ```
//! use resnet_prune_env::config::ResourceMetric;
//! use resnet_prune_env::env::{run_episode, ResNetProxy};
//!
//! let mut env = ResNetProxy::resnet20(ResourceMetric::Params, 0.5, 0.2, true).unwrap();
//! let steps = run_episode(&mut env, |_| 0.7).unwrap();
//! assert_eq!(steps.len(), env.topology().len() - 1);
//! ```

pub mod bounds;
pub mod proxy;
pub mod state;

pub use bounds::{feasible_interval, lookahead, FeasibleInterval, Lookahead};
pub use proxy::ResNetProxy;
pub use state::{Observation, StepOutcome, Trajectory};

use crate::error::Result;

/// Core trait for sequential compression environments.
///
/// Implementations hold the state of one episode and are stepped by a single
/// caller in order; every step depends on the totals written by the previous
/// ones.
pub trait Environment {
    /// Starts a new episode.
    ///
    /// Discards any previous episode state and returns the observation of
    /// the first layer, a zero reward and the `done` flag.
    fn init_episode(&mut self) -> (Observation, f64, bool);

    /// Applies a proposed keep-ratio to the current layer and advances.
    ///
    /// # Errors
    ///
    /// - `ProxyError::ActionOutOfDomain` if `action` is NaN or infinite
    /// - `ProxyError::EpisodeNotStarted` before `init_episode`
    /// - `ProxyError::EpisodeFinished` once `done` was reported
    fn compress(&mut self, action: f64) -> Result<StepOutcome>;

    /// True once the terminal layer has been reached.
    fn is_done(&self) -> bool;
}

/// Runs one full episode, asking `policy` for an action at every layer.
///
/// Returns the outcome of every `compress` call in order.
pub fn run_episode<E, P>(env: &mut E, mut policy: P) -> Result<Vec<StepOutcome>>
where
    E: Environment + ?Sized,
    P: FnMut(&Observation) -> f64,
{
    let (mut observation, _, mut done) = env.init_episode();
    let mut steps = Vec::new();

    while !done {
        let outcome = env.compress(policy(&observation))?;
        observation = outcome.observation;
        done = outcome.done;
        steps.push(outcome);
    }

    Ok(steps)
}
