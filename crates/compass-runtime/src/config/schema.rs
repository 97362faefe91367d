//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use compass_framework::{ComponentManager, ManagerResult, ManagerStore, is_dedup_char};
use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompassConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-manager settings, keyed by manager name (`"root"`, `"shop.cart"`).
    #[serde(default)]
    pub managers: BTreeMap<String, ManagerConfig>,
}

impl CompassConfig {
    /// Checks values that deserialize fine but cannot be applied.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, manager) in &self.managers {
            manager.validate(name)?;
        }
        Ok(())
    }

    /// Applies every manager section to `store`, creating managers as needed.
    pub fn apply_managers(&self, store: &ManagerStore) -> ManagerResult<()> {
        for (name, manager) in &self.managers {
            manager.apply(&store.get_manager(Some(name)))?;
        }
        Ok(())
    }
}

// =============================================================================
// Managers
// =============================================================================

/// Settings for one component manager. Unset values are inherited from the
/// manager's parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Separator between identifier and parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sep: Option<String>,

    /// Whether custom ids carry a deduplication counter character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<bool>,
}

impl ManagerConfig {
    fn validate(&self, name: &str) -> ConfigResult<()> {
        match self.sep.as_deref() {
            Some("") => Err(ConfigError::validation(format!(
                "managers.{name}.sep must not be empty"
            ))),
            Some(sep) if sep.chars().any(is_dedup_char) => Err(ConfigError::validation(format!(
                "managers.{name}.sep must not contain dedup counter characters"
            ))),
            _ => Ok(()),
        }
    }

    /// Configures `manager` with the values set here; unset values leave
    /// the manager as it is.
    pub fn apply(&self, manager: &ComponentManager) -> ManagerResult<()> {
        if let Some(sep) = &self.sep {
            manager.set_sep(Some(sep))?;
        }
        if let Some(count) = self.count {
            manager.set_count(Some(count));
        }
        Ok(())
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, used with `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-target levels, e.g. `compass_framework = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}
