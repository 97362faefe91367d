//! Compass Runtime: configuration, logging and client binding for the
//! Compass component framework.
//!
//! The framework itself needs no setup beyond registering components and
//! binding the root manager to a client. This crate does that binding from
//! a layered configuration file, and sets up `tracing` output on the way.
//!
//! ```rust,ignore
//! use compass_runtime::CompassRuntime;
//!
//! let runtime = CompassRuntime::new();
//! runtime.bind(client)?;
//! ```
//!
//! A `compass.toml` next to the binary configures managers by name:
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [managers.root]
//! count = true
//!
//! [managers."shop.cart"]
//! sep = ":"
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{CompassConfig, ConfigError, ConfigLoader, ConfigResult, ManagerConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{CompassRuntime, RuntimeBuilder};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros, for applications that do not depend on `tracing` directly.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
