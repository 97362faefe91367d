//! Configuration for the Compass runtime.
//!
//! Settings are layered with figment: built-in defaults, a `compass.toml`
//! or `compass.yaml` file, then `COMPASS_*` environment variables.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CompassConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, ManagerConfig, SpanEventConfig,
};
