//! Error types for topology construction and episode stepping

use thiserror::Error;

/// Errors emitted while loading a configuration, building a topology, or
/// driving an episode.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("proposed action {0} is not a finite number")]
    ActionOutOfDomain(f64),
    #[error("episode has not been started; call init_episode first")]
    EpisodeNotStarted,
    #[error("episode already reached the terminal layer")]
    EpisodeFinished,
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ProxyError>;
