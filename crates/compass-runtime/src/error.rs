//! Runtime error types.

use compass_framework::ManagerError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while setting up or tearing down the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Manager error: {0}")]
    Manager(#[from] ManagerError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
