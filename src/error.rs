/*
 * Error Module
 *
 * Errors raised while configuring the flock. Steady-state ticking never
 * fails; everything here is reported at construction or configuration time.
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlockError {
    /// A parameter or configuration value that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FlockError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FlockError::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FlockError>;
