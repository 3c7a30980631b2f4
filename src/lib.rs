//! ResNet Channel Pruning Environment
//!
//! This library simulates, layer by layer, the choice of how many filters to
//! keep in each 3×3 conv layer of a ResNet-style chain under a global
//! parameter or FLOPs budget. An external policy proposes a keep-ratio per
//! layer; the environment clips it so the whole network can still land inside
//! the budget window, commits it and moves on.
//!
//! # Modules
//!
//! - `config`: Environment configuration, presets and JSON loading
//! - `architecture`: Topology model (layer chain, resource tables, budget)
//! - `env`: Episode state machine and feasibility bounds
//! - `layers`: Conv layer geometry and cost accounting
//! - `error`: Error type shared by the crate
//! - `utils`: Rounding rules, seeded RNG, tracing setup

pub mod architecture;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod utils;

pub use error::{ProxyError, Result};
