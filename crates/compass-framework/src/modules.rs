//! Module liveness tracking.
//!
//! Registrations remember the module their component type was declared in
//! (`module_path!()`) together with that module's generation at the time.
//! Plugin hosts that unload or hot-reload code report it here:
//!
//! - [`reload_module`] starts a new generation. Registrations from older
//!   generations go stale, and re-registering an identifier from the new
//!   generation is accepted as a reload instead of a duplicate.
//! - [`unload_module`] makes every registration from the module stale.
//!
//! Modules that are never reported are always live.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use parking_lot::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct ModuleState {
    generation: u64,
    loaded: bool,
}

static MODULES: LazyLock<RwLock<HashMap<String, ModuleState>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A module name paired with the generation it had when stamped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleStamp {
    name: String,
    generation: u64,
}

impl ModuleStamp {
    /// Stamps `module` with its current generation.
    pub fn current(module: &str) -> Self {
        let generation = MODULES.read().get(module).map_or(0, |s| s.generation);
        Self {
            name: module.to_string(),
            generation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Same module, different generation.
    pub fn is_reload_of(&self, other: &ModuleStamp) -> bool {
        self.name == other.name && self.generation != other.generation
    }

    pub fn is_live(&self) -> bool {
        is_live(self)
    }
}

impl fmt::Display for ModuleStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.generation)
    }
}

/// Marks a module as loaded, keeping its generation. Returns the generation.
pub fn load_module(module: &str) -> u64 {
    let mut modules = MODULES.write();
    let state = modules.entry(module.to_string()).or_insert(ModuleState {
        generation: 0,
        loaded: true,
    });
    state.loaded = true;
    debug!(module, generation = state.generation, "Module loaded");
    state.generation
}

/// Starts a new generation of a module. Returns the new generation.
pub fn reload_module(module: &str) -> u64 {
    let mut modules = MODULES.write();
    let state = modules.entry(module.to_string()).or_insert(ModuleState {
        generation: 0,
        loaded: true,
    });
    state.generation += 1;
    state.loaded = true;
    debug!(module, generation = state.generation, "Module reloaded");
    state.generation
}

pub fn unload_module(module: &str) {
    let mut modules = MODULES.write();
    let state = modules.entry(module.to_string()).or_insert(ModuleState {
        generation: 0,
        loaded: false,
    });
    state.loaded = false;
    debug!(module, generation = state.generation, "Module unloaded");
}

/// Whether the stamped module is still loaded at the stamped generation.
pub fn is_live(stamp: &ModuleStamp) -> bool {
    match MODULES.read().get(&stamp.name) {
        Some(state) => state.loaded && state.generation == stamp.generation,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untracked_modules_are_live() {
        let stamp = ModuleStamp::current("modules::tests::untracked");
        assert_eq!(stamp.generation(), 0);
        assert!(stamp.is_live());
    }

    #[test]
    fn test_reload_makes_old_stamps_stale() {
        let module = "modules::tests::reloaded";
        load_module(module);
        let old = ModuleStamp::current(module);

        assert_eq!(reload_module(module), 1);
        let new = ModuleStamp::current(module);

        assert!(!old.is_live());
        assert!(new.is_live());
        assert!(new.is_reload_of(&old));
        assert!(!new.is_reload_of(&new.clone()));
    }

    #[test]
    fn test_unload_then_load_revives_same_generation() {
        let module = "modules::tests::unloaded";
        let stamp = ModuleStamp::current(module);
        unload_module(module);
        assert!(!stamp.is_live());

        assert_eq!(load_module(module), 0);
        assert!(stamp.is_live());
    }
}
