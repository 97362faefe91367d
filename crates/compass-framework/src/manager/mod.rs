//! Component managers: a dot-separated hierarchy of component registries.
//!
//! Managers work much like loggers. [`get_manager`] creates missing
//! managers lazily, and `"foo.bar"` is a child of `"foo"`, which is a child
//! of the root manager. A component registered on a manager is visible to
//! every ancestor. Configuration (separator, dedup counting) and the bound
//! client are inherited from the nearest ancestor that sets them.
//!
//! When a component is invoked, the hooks of the manager chain run around
//! the callback:
//!
//! ```text
//! providers.enter   root ─▶ foo ─▶ foo.bar
//! wrappers.before   root ─▶ foo ─▶ foo.bar
//!                        callback
//! wrappers.after    foo.bar ─▶ foo ─▶ root
//! handlers          foo.bar ─▶ foo ─▶ root   (first `true` stops)
//! providers.exit    foo.bar ─▶ foo ─▶ root
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let manager = get_manager(Some("bot.counters"));
//! manager.register::<Counter>()?;
//!
//! let button = manager.render(&Counter { count: 0, ..Default::default() }).await?;
//! get_manager(None).add_to_client(client)?;
//! ```

mod custom_id;
mod dispatch;
mod hooks;
mod layout;
mod registry;

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, LazyLock, Weak};

use compass_core::{BoxedClient, Component, MESSAGE_INTERACTION_EVENT, into_listener};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::component::RichComponent;
use crate::error::{ManagerError, ManagerResult};
use crate::modules::ModuleStamp;

pub use custom_id::{MAX_CUSTOM_ID_LEN, dedup_char, is_dedup_char};
pub use dispatch::{RequestScope, current_custom_id, current_dependencies, resolve};
pub use hooks::{
    CallbackWrapper, DefaultHandler, DefaultProvider, DependencyProvider, ExceptionHandler,
    NoopWrapper,
};
pub use layout::RichSlot;

use hooks::Hooks;
use registry::Registration;

/// Name of the root manager.
pub const ROOT: &str = "root";

/// Separator used when no manager in the chain sets one.
pub const DEFAULT_SEP: &str = "|";

/// Dedup counting used when no manager in the chain sets it.
pub const DEFAULT_COUNT: bool = false;

pub struct ComponentManager {
    name: String,
    parent: Option<Arc<ComponentManager>>,
    children: RwLock<Vec<Weak<ComponentManager>>>,
    components: RwLock<HashMap<String, Registration>>,
    identifiers: RwLock<HashMap<TypeId, String>>,
    /// Only populated on the root.
    modules: RwLock<HashMap<String, ModuleStamp>>,
    sep: RwLock<Option<String>>,
    count: RwLock<Option<bool>>,
    counter: AtomicU8,
    client: RwLock<Option<BoxedClient>>,
    hooks: RwLock<Hooks>,
}

impl ComponentManager {
    fn new(name: &str, parent: Option<Arc<ComponentManager>>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: RwLock::new(Vec::new()),
            components: RwLock::new(HashMap::new()),
            identifiers: RwLock::new(HashMap::new()),
            modules: RwLock::new(HashMap::new()),
            sep: RwLock::new(None),
            count: RwLock::new(None),
            counter: AtomicU8::new(0),
            client: RwLock::new(None),
            hooks: RwLock::new(Hooks::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<&Arc<ComponentManager>> {
        self.parent.as_ref()
    }

    /// Child managers that have been created so far.
    pub fn children(&self) -> Vec<Arc<ComponentManager>> {
        self.children.read().iter().filter_map(Weak::upgrade).collect()
    }

    /// This manager followed by its ancestors, ending at the root.
    pub fn chain(self: &Arc<Self>) -> Vec<Arc<ComponentManager>> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent.clone();
        while let Some(manager) = current {
            current = manager.parent.clone();
            chain.push(manager);
        }
        chain
    }

    pub fn root(self: &Arc<Self>) -> Arc<ComponentManager> {
        let mut current = self.clone();
        while let Some(parent) = current.parent.clone() {
            current = parent;
        }
        current
    }

    fn inherited<T: Clone>(&self, get: impl Fn(&ComponentManager) -> Option<T>) -> Option<T> {
        let mut current = Some(self);
        while let Some(manager) = current {
            if let Some(value) = get(manager) {
                return Some(value);
            }
            current = manager.parent.as_deref();
        }
        None
    }

    // ─── Configuration ───

    /// The effective separator.
    pub fn sep(&self) -> String {
        self.inherited(|m| m.sep.read().clone())
            .unwrap_or_else(|| DEFAULT_SEP.to_string())
    }

    /// Whether dedup counting is in effect.
    pub fn count(&self) -> bool {
        self.inherited(|m| *m.count.read()).unwrap_or(DEFAULT_COUNT)
    }

    /// Sets the separator. `None` or an empty string inherits it again.
    ///
    /// Separators may not contain dedup counter characters, which are
    /// stripped from identifiers before lookup.
    pub fn set_sep(&self, sep: Option<&str>) -> ManagerResult<()> {
        let sep = sep.filter(|s| !s.is_empty()).map(str::to_string);
        if let Some(sep) = sep.as_deref().filter(|s| s.chars().any(is_dedup_char)) {
            return Err(ManagerError::InvalidSeparator {
                sep: sep.to_string(),
                manager: self.name.clone(),
            });
        }
        debug!(manager = %self.name, sep = ?sep, "Separator configured");
        *self.sep.write() = sep;
        Ok(())
    }

    /// Sets dedup counting. `None` inherits it again.
    pub fn set_count(&self, count: Option<bool>) {
        debug!(manager = %self.name, count = ?count, "Counting configured");
        *self.count.write() = count;
    }

    /// Sets both options at once.
    pub fn configure(&self, sep: Option<&str>, count: Option<bool>) -> ManagerResult<()> {
        self.set_sep(sep)?;
        self.set_count(count);
        Ok(())
    }

    /// Current value of the dedup counter.
    pub fn counter(&self) -> u8 {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn set_counter(&self, value: u8) {
        self.counter.store(value, Ordering::Relaxed);
    }

    // ─── Client binding ───

    /// The client bound to this manager or its nearest bound ancestor.
    pub fn client(&self) -> ManagerResult<BoxedClient> {
        self.inherited(|m| m.client.read().clone())
            .ok_or_else(|| ManagerError::NotBound(self.name.clone()))
    }

    /// Binds this manager to `client` and starts listening for component
    /// interactions. The listener is keyed by the manager's name.
    pub fn add_to_client(self: &Arc<Self>, client: BoxedClient) -> ManagerResult<()> {
        let mut slot = self.client.write();
        if slot.is_some() {
            return Err(ManagerError::AlreadyBound(self.name.clone()));
        }

        let manager = Arc::downgrade(self);
        let listener = into_listener(move |interaction| {
            let manager = manager.clone();
            async move {
                if let Some(manager) = manager.upgrade() {
                    manager.invoke(&interaction).await;
                }
            }
        });
        client
            .listeners()
            .add(MESSAGE_INTERACTION_EVENT, self.name.clone(), listener)?;

        info!(manager = %self.name, "Manager bound to client");
        *slot = Some(client);
        Ok(())
    }

    /// Stops listening and unbinds the client, returning it.
    pub fn remove_from_client(&self) -> ManagerResult<BoxedClient> {
        let mut slot = self.client.write();
        let Some(client) = slot.as_ref() else {
            return Err(ManagerError::NotBound(self.name.clone()));
        };

        client
            .listeners()
            .remove(MESSAGE_INTERACTION_EVENT, &self.name)?;

        info!(manager = %self.name, "Manager unbound from client");
        slot.take().ok_or_else(|| ManagerError::NotBound(self.name.clone()))
    }

    // ─── Rendering ───

    /// Renders `component` with a freshly made custom id.
    pub async fn render(&self, component: &dyn RichComponent) -> ManagerResult<Component> {
        let custom_id = self.make_custom_id(component).await?;
        Ok(component.as_ui_component(custom_id))
    }
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("name", &self.name)
            .field("components", &self.components.read().len())
            .field("sep", &self.sep.read())
            .field("count", &self.count.read())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Manager store
// =============================================================================

/// A namespace of managers. The process-wide one backs [`get_manager`].
#[derive(Default)]
pub struct ManagerStore {
    managers: Mutex<HashMap<String, Arc<ComponentManager>>>,
}

impl ManagerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a manager by name, creating it and any missing ancestors.
    ///
    /// `None` and the empty string both name the root.
    pub fn get_manager(&self, name: Option<&str>) -> Arc<ComponentManager> {
        let name = name.filter(|n| !n.is_empty()).unwrap_or(ROOT);
        get_or_create(&mut self.managers.lock(), name)
    }

    /// Whether a manager with this name exists, without creating it.
    pub fn check_manager(&self, name: &str) -> bool {
        self.managers.lock().contains_key(name)
    }

    pub fn root(&self) -> Arc<ComponentManager> {
        self.get_manager(None)
    }

    /// The process-wide store.
    pub fn global() -> &'static ManagerStore {
        &MANAGERS
    }
}

fn get_or_create(
    managers: &mut HashMap<String, Arc<ComponentManager>>,
    name: &str,
) -> Arc<ComponentManager> {
    if let Some(manager) = managers.get(name) {
        return manager.clone();
    }

    let parent = (name != ROOT).then(|| {
        let parent_name = name.rsplit_once('.').map_or(ROOT, |(parent, _)| parent);
        get_or_create(managers, parent_name)
    });

    let manager = Arc::new(ComponentManager::new(name, parent.clone()));
    if let Some(parent) = parent {
        parent.children.write().push(Arc::downgrade(&manager));
    }
    debug!(manager = name, "Manager created");

    managers.insert(name.to_string(), manager.clone());
    manager
}

static MANAGERS: LazyLock<ManagerStore> = LazyLock::new(ManagerStore::new);

/// Gets a manager from the process-wide store, creating it if needed.
pub fn get_manager(name: Option<&str>) -> Arc<ComponentManager> {
    MANAGERS.get_manager(name)
}

/// Whether the process-wide store has a manager with this name.
pub fn check_manager(name: &str) -> bool {
    MANAGERS.check_manager(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_is_created_lazily() {
        let store = ManagerStore::new();
        let leaf = store.get_manager(Some("a.b.c"));

        assert!(store.check_manager("a"));
        assert!(store.check_manager("a.b"));
        assert!(!store.check_manager("a.b.c.d"));

        let names: Vec<_> = leaf.chain().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, ["a.b.c", "a.b", "a", "root"]);
        assert!(leaf.root().is_root());

        let a = store.get_manager(Some("a"));
        assert_eq!(a.children().len(), 1);
        assert!(Arc::ptr_eq(&store.get_manager(Some("")), &store.root()));
    }

    #[test]
    fn test_config_is_inherited() {
        let store = ManagerStore::new();
        let child = store.get_manager(Some("child"));
        assert_eq!(child.sep(), DEFAULT_SEP);
        assert_eq!(child.count(), DEFAULT_COUNT);

        store.root().configure(Some(":"), Some(true)).unwrap();
        assert_eq!(child.sep(), ":");
        assert!(child.count());

        child.set_sep(Some("/")).unwrap();
        assert_eq!(child.sep(), "/");
        child.set_sep(Some("")).unwrap();
        assert_eq!(child.sep(), ":");
    }

    #[test]
    fn test_separator_rejects_dedup_chars() {
        let store = ManagerStore::new();
        let manager = store.get_manager(Some("x"));
        manager.set_sep(Some("/")).unwrap();

        let sep = format!(":{}", dedup_char(3));
        let err = manager.set_sep(Some(&sep)).unwrap_err();
        assert!(matches!(err, ManagerError::InvalidSeparator { manager, .. } if manager == "x"));
        assert_eq!(manager.sep(), "/");

        assert!(manager.configure(Some(&dedup_char(0).to_string()), Some(true)).is_err());
        assert!(!manager.count());
    }

    #[test]
    fn test_unbound_client_is_an_error() {
        let store = ManagerStore::new();
        let Err(err) = store.get_manager(Some("x")).client() else {
            panic!("unbound manager returned a client");
        };
        assert!(matches!(err, ManagerError::NotBound(name) if name == "x"));
        assert!(store.root().remove_from_client().is_err());
    }
}
