//! Error types for the platform model.
//!
//! Framework-level errors (parsing, definition, dispatch) live in
//! `compass-framework`.

use thiserror::Error;

use crate::model::Snowflake;

// =============================================================================
// Platform Errors
// =============================================================================

/// Errors reported by a platform [`Client`](crate::Client).
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// The requested object does not exist on the platform.
    #[error("{kind} {id} not found")]
    NotFound {
        /// The kind of object, e.g. `"user"`.
        kind: &'static str,
        /// The id that was requested.
        id: Snowflake,
    },

    /// The client is not allowed to access the object.
    #[error("missing access to {kind} {id}")]
    Forbidden {
        /// The kind of object.
        kind: &'static str,
        /// The id that was requested.
        id: Snowflake,
    },

    /// The client does not implement this operation.
    #[error("operation '{0}' is not supported by this client")]
    Unsupported(&'static str),

    /// Any other HTTP or gateway failure.
    #[error("platform request failed: {0}")]
    Request(String),
}

impl PlatformError {
    /// Creates a not-found error.
    pub fn not_found(kind: &'static str, id: impl Into<Snowflake>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a generic request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Returns `true` if the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for platform calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

// =============================================================================
// Listener Errors
// =============================================================================

/// Errors raised by the [`Listeners`](crate::Listeners) registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    /// A listener with this key is already attached to the event.
    #[error("listener '{key}' is already registered for event '{event}'")]
    AlreadyRegistered {
        /// Event name.
        event: String,
        /// Listener key.
        key: String,
    },

    /// No listener with this key is attached to the event.
    #[error("listener '{key}' is not registered for event '{event}'")]
    NotRegistered {
        /// Event name.
        event: String,
        /// Listener key.
        key: String,
    },
}
