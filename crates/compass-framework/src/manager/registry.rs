//! Registration and deregistration of component types.

use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use super::ComponentManager;
use super::custom_id::is_dedup_char;
use crate::component::{ComponentType, RichComponent};
use crate::error::{DefinitionError, ManagerError, ManagerResult};
use crate::modules::ModuleStamp;
use crate::reflect::TypeKey;

/// An identifier's entry on one manager of the chain.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) ty: Arc<ComponentType>,
    /// The manager `register` was called on.
    pub(crate) registrar: Weak<ComponentManager>,
}

impl ComponentManager {
    /// Registers `T` under its type name.
    pub fn register<T: RichComponent>(self: &Arc<Self>) -> ManagerResult<Arc<ComponentType>> {
        let ty = ComponentType::of::<T>()?;
        let identifier = ty.name().to_string();
        self.register_type(ty, identifier)
    }

    /// Registers `T` under a custom identifier.
    pub fn register_as<T: RichComponent>(
        self: &Arc<Self>,
        identifier: impl Into<String>,
    ) -> ManagerResult<Arc<ComponentType>> {
        let ty = ComponentType::of::<T>()?;
        self.register_type(ty, identifier.into())
    }

    fn register_type(
        self: &Arc<Self>,
        ty: Arc<ComponentType>,
        identifier: String,
    ) -> ManagerResult<Arc<ComponentType>> {
        if ty.is_template() {
            return Err(DefinitionError::TemplateRegistration(ty.name()).into());
        }
        self.validate_identifier(&identifier)?;

        let root = self.root();
        let stamp = ModuleStamp::current(ty.module());

        // Held until every manager of the chain is updated.
        let mut modules = root.modules.write();
        if root.components.read().contains_key(&identifier) {
            if let Some(original) = modules.get(&identifier) {
                if !stamp.is_reload_of(original) {
                    return Err(DefinitionError::DuplicateIdentifier {
                        identifier,
                        original_module: original.name().to_string(),
                        duplicate_module: stamp.name().to_string(),
                    }
                    .into());
                }
                warn!(
                    identifier = %identifier,
                    module = %stamp,
                    "Replacing component registered by a previous module generation"
                );
            }
        }

        let registrar = Arc::downgrade(self);
        for manager in self.chain() {
            manager.components.write().insert(
                identifier.clone(),
                Registration {
                    ty: ty.clone(),
                    registrar: registrar.clone(),
                },
            );
            if let Some(key) = ty.key() {
                manager
                    .identifiers
                    .write()
                    .insert(key.id(), identifier.clone());
            }
        }
        modules.insert(identifier.clone(), stamp);

        info!(
            manager = %self.name,
            identifier = %identifier,
            component = ty.name(),
            "Component registered"
        );
        Ok(ty)
    }

    fn validate_identifier(&self, identifier: &str) -> Result<(), DefinitionError> {
        if identifier.is_empty() {
            return Err(DefinitionError::invalid_identifier(
                identifier,
                "identifier must not be empty",
            ));
        }

        let sep = self.sep();
        if identifier.contains(sep.as_str()) {
            return Err(DefinitionError::invalid_identifier(
                identifier,
                format!("identifier must not contain the separator '{sep}'"),
            ));
        }

        if identifier.chars().last().is_some_and(is_dedup_char) {
            return Err(DefinitionError::invalid_identifier(
                identifier,
                "identifier must not end in a reserved counter character",
            ));
        }
        Ok(())
    }

    /// Removes a registration from its registrar and every ancestor of it.
    pub fn deregister(self: &Arc<Self>, identifier: &str) -> ManagerResult<Arc<ComponentType>> {
        let registration = self.registration(identifier).ok_or_else(|| {
            ManagerError::UnknownIdentifier {
                identifier: identifier.to_string(),
                manager: self.name.clone(),
            }
        })?;
        let registrar = registration.registrar.upgrade().unwrap_or_else(|| self.clone());

        let root = self.root();
        let mut modules = root.modules.write();
        for manager in registrar.chain() {
            manager.components.write().remove(identifier);
            manager.identifiers.write().retain(|_, id| id != identifier);
        }
        modules.remove(identifier);

        debug!(
            manager = %registrar.name,
            identifier,
            component = registration.ty.name(),
            "Component deregistered"
        );
        Ok(registration.ty)
    }

    pub(crate) fn registration(&self, identifier: &str) -> Option<Registration> {
        self.components.read().get(identifier).cloned()
    }

    /// The registration of `identifier`, if it is still live.
    ///
    /// Registrations whose module was unloaded or reloaded since they were
    /// made are deregistered on the spot.
    pub(crate) fn live_registration(self: &Arc<Self>, identifier: &str) -> Option<Registration> {
        let registration = self.registration(identifier)?;
        let stamp = self.root().modules.read().get(identifier).cloned();

        if let Some(stamp) = stamp.filter(|s| !s.is_live()) {
            info!(
                identifier,
                module = %stamp,
                "Dropping component from an unloaded module"
            );
            if let Err(error) = self.deregister(identifier) {
                warn!(identifier, %error, "Failed to deregister stale component");
            }
            return None;
        }
        Some(registration)
    }

    /// The component type registered under `identifier`.
    pub fn component_type(&self, identifier: &str) -> Option<Arc<ComponentType>> {
        self.registration(identifier).map(|r| r.ty)
    }

    /// All identifiers visible to this manager with their types.
    pub fn components(&self) -> Vec<(String, Arc<ComponentType>)> {
        let mut components: Vec<_> = self
            .components
            .read()
            .iter()
            .map(|(id, r)| (id.clone(), r.ty.clone()))
            .collect();
        components.sort_by(|a, b| a.0.cmp(&b.0));
        components
    }

    /// The identifier a component type is registered under.
    pub fn identifier_of(&self, key: TypeKey) -> ManagerResult<String> {
        self.identifiers
            .read()
            .get(&key.id())
            .cloned()
            .ok_or_else(|| ManagerError::NotRegistered {
                component: key.short_name(),
                manager: self.name.clone(),
            })
    }

    pub fn is_registered<T: RichComponent>(&self) -> bool {
        self.identifier_of(TypeKey::of::<T>()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ManagerStore;
    use crate::modules::reload_module;
    use crate::testing::{Counter, Faulty, Reloadable};

    #[test]
    fn test_register_propagates_to_ancestors() {
        let store = ManagerStore::new();
        let leaf = store.get_manager(Some("a.b"));
        tokio_test::assert_ok!(leaf.register::<Counter>());

        for name in ["a.b", "a", "root"] {
            let manager = store.get_manager(Some(name));
            assert!(manager.component_type("Counter").is_some(), "{name}");
            assert_eq!(manager.identifier_of(TypeKey::of::<Counter>()).unwrap(), "Counter");
        }
        assert!(!store.get_manager(Some("other")).is_registered::<Counter>());
    }

    #[test]
    fn test_duplicate_identifier_names_both_modules() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register_as::<Counter>("Shared").unwrap();

        let err = root.register_as::<Faulty>("Shared").unwrap_err();
        let ManagerError::Definition(DefinitionError::DuplicateIdentifier {
            original_module,
            duplicate_module,
            ..
        }) = err
        else {
            panic!("expected a duplicate identifier error, got {err:?}");
        };
        assert_eq!(original_module, duplicate_module);
        assert!(original_module.ends_with("testing"));

        // The failed registration left nothing behind.
        assert!(!root.is_registered::<Faulty>());
    }

    #[test]
    fn test_reloaded_module_may_register_again() {
        let store = ManagerStore::new();
        let root = store.root();
        root.register::<Reloadable<0>>().unwrap();
        assert!(root.register::<Reloadable<0>>().is_err());

        reload_module(Reloadable::<0>::MODULE);
        root.register::<Reloadable<0>>().unwrap();
    }

    #[test]
    fn test_invalid_identifiers_are_rejected() {
        let store = ManagerStore::new();
        let root = store.root();
        for identifier in ["", "a|b", "tail\u{e0ff}", "tail\u{1}"] {
            let err = root.register_as::<Counter>(identifier).unwrap_err();
            assert!(
                matches!(
                    err,
                    ManagerError::Definition(DefinitionError::InvalidIdentifier { .. })
                ),
                "{identifier:?}"
            );
        }
    }

    #[test]
    fn test_deregister_walks_from_registrar_to_root() {
        let store = ManagerStore::new();
        let leaf = store.get_manager(Some("x.y"));
        leaf.register::<Counter>().unwrap();

        // Deregistering through the root still clears the registrar.
        store.root().deregister("Counter").unwrap();
        for name in ["x.y", "x", "root"] {
            assert!(store.get_manager(Some(name)).component_type("Counter").is_none());
        }

        let err = tokio_test::assert_err!(store.root().deregister("Counter"));
        assert!(matches!(err, ManagerError::UnknownIdentifier { .. }));
    }
}
