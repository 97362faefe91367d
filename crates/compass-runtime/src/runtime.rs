//! Runtime bootstrap: load configuration, configure managers, bind the
//! root manager to a client.
//!
//! ```rust,ignore
//! use compass_runtime::CompassRuntime;
//!
//! // Auto-loads compass.toml from the current directory
//! let runtime = CompassRuntime::new();
//!
//! // Or pick the file and profile
//! let runtime = CompassRuntime::builder()
//!     .config_file("config/compass.toml")
//!     .profile("production")
//!     .build()?;
//!
//! runtime.bind(client)?;
//! ```

use std::path::Path;
use std::sync::Arc;

use compass_core::BoxedClient;
use compass_framework::{ComponentManager, ManagerStore};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::{CompassConfig, ConfigLoader};
use crate::error::RuntimeResult;
use crate::logging;

/// Owns the loaded configuration and the client binding of the root
/// manager of a [`ManagerStore`].
pub struct CompassRuntime {
    config: CompassConfig,
    store: &'static ManagerStore,
    bound: Mutex<bool>,
}

impl CompassRuntime {
    /// Loads configuration from the current directory and the environment,
    /// falling back to defaults if that fails.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                CompassConfig::default()
            });

        Self::from_config(config)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Uses `config` with the process-wide manager store.
    pub fn from_config(config: CompassConfig) -> Self {
        Self::with_store(config, ManagerStore::global())
    }

    fn with_store(config: CompassConfig, store: &'static ManagerStore) -> Self {
        Self {
            config,
            store,
            bound: Mutex::new(false),
        }
    }

    pub fn config(&self) -> &CompassConfig {
        &self.config
    }

    pub fn root(&self) -> Arc<ComponentManager> {
        self.store.root()
    }

    /// Gets a manager from this runtime's store, creating it if needed.
    pub fn manager(&self, name: &str) -> Arc<ComponentManager> {
        self.store.get_manager(Some(name))
    }

    /// Initializes logging, applies the manager sections of the
    /// configuration and binds the root manager to `client`.
    pub fn bind(&self, client: BoxedClient) -> RuntimeResult<()> {
        logging::init_from_config(&self.config.logging);

        let mut bound = self.bound.lock();
        self.config.apply_managers(self.store)?;
        self.root().add_to_client(client)?;
        *bound = true;

        info!(
            log_level = %self.config.logging.level,
            managers = self.config.managers.len(),
            "Runtime bound to client"
        );
        Ok(())
    }

    /// Unbinds the root manager and returns its client.
    pub fn unbind(&self) -> RuntimeResult<BoxedClient> {
        let mut bound = self.bound.lock();
        let client = self.root().remove_from_client()?;
        *bound = false;

        info!("Runtime unbound from client");
        Ok(client)
    }

    pub fn is_bound(&self) -> bool {
        *self.bound.lock()
    }
}

impl Default for CompassRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CompassRuntime {
    fn drop(&mut self) {
        if *self.bound.get_mut() && self.root().remove_from_client().is_err() {
            warn!("Root manager was already unbound when the runtime was dropped");
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`CompassRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<CompassConfig>,
    store: &'static ManagerStore,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            config: None,
            store: ManagerStore::global(),
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration below files and the environment.
    pub fn merge(mut self, config: CompassConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `config` as is, skipping every other source.
    pub fn config(mut self, config: CompassConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses another manager namespace instead of the process-wide one.
    pub fn store(mut self, store: &'static ManagerStore) -> Self {
        self.store = store;
        self
    }

    pub fn build(self) -> RuntimeResult<CompassRuntime> {
        let config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => self.config_loader.load()?,
        };
        Ok(CompassRuntime::with_store(config, self.store))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
