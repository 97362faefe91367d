//! Request-scoped dependencies.
//!
//! A [`Dependencies`] map is filled by the dependency providers of a
//! manager chain before a component is decoded, and is visible to parsers
//! (as an argument) and to callbacks (through [`resolve`](crate::resolve)).
//! Values are keyed by type; inserting a second value of the same type
//! replaces the first, so providers closer to the registrar override the
//! ones closer to the root.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::LookupError;

#[derive(Clone, Default)]
pub struct Dependencies {
    values: HashMap<TypeId, (&'static str, Arc<dyn Any + Send + Sync>)>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning `true` if it replaced one of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> bool {
        self.values
            .insert(TypeId::of::<T>(), (type_name::<T>(), Arc::new(value)))
            .is_some()
    }

    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|(_, v)| v.downcast_ref::<T>())
    }

    /// Like [`get`](Self::get), failing with [`LookupError::MissingDependency`].
    pub fn require<T: Send + Sync + 'static>(&self) -> Result<&T, LookupError> {
        self.get::<T>()
            .ok_or(LookupError::MissingDependency(type_name::<T>()))
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> bool {
        self.values.remove(&TypeId::of::<T>()).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.values.values().map(|(name, _)| name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_same_type() {
        let mut deps = Dependencies::new();
        assert!(!deps.insert(1u32));
        assert!(deps.insert(2u32));
        assert_eq!(deps.get::<u32>(), Some(&2));
        assert_eq!(deps.len(), 1);
    }

    #[test]
    fn test_require_reports_type_name() {
        let deps = Dependencies::new().with(String::from("x"));
        assert_eq!(deps.require::<String>().unwrap(), "x");

        let err = deps.require::<u64>().unwrap_err();
        assert!(matches!(err, LookupError::MissingDependency("u64")));
    }
}
