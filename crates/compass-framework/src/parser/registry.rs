//! Type-directed parser registry.
//!
//! Lookup order for a [`FieldType`]:
//!
//! 1. an entry registered for the exact type (or the origin of a generic
//!    type such as `Option<T>`);
//! 2. otherwise every entry registered for one of the type's declared
//!    bases, picking the highest priority and, on a tie, the entry
//!    registered first.
//!
//! Built-in parsers are contributed through the [`BUILTIN_PARSERS`]
//! distributed slice and loaded in name order, so the tie-break is the same
//! on every build. Other crates may contribute entries to the same slice or
//! call [`register_parser`] at startup.

use std::collections::HashMap;
use std::sync::LazyLock;

use linkme::distributed_slice;
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::BoxedParser;
use crate::error::{ParseError, ParseResult};
use crate::reflect::{FieldType, TypeKey};

/// Builds a parser for a concrete field type.
///
/// Generic entries use the registry to resolve parsers for the type's
/// arguments.
pub type ParserFactoryFn = fn(&FieldType, &ParserRegistry) -> ParseResult<BoxedParser>;

/// One registry entry.
#[derive(Clone, Copy)]
pub struct ParserRegistration {
    /// Name for logs and diagnostics.
    pub name: &'static str,
    /// Types (or origins, or bases) this entry handles.
    pub types: &'static [fn() -> TypeKey],
    pub priority: i32,
    pub factory: ParserFactoryFn,
}

impl std::fmt::Debug for ParserRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistration")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Parsers contributed at link time.
#[distributed_slice]
pub static BUILTIN_PARSERS: [ParserRegistration];

struct Entry {
    registration: ParserRegistration,
    types: Vec<TypeKey>,
}

/// Maps types to parser factories.
#[derive(Default)]
pub struct ParserRegistry {
    exact: HashMap<TypeKey, usize>,
    entries: Vec<Entry>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every entry of [`BUILTIN_PARSERS`].
    pub fn with_builtins() -> Self {
        let mut builtins: Vec<ParserRegistration> = BUILTIN_PARSERS.iter().copied().collect();
        builtins.sort_by_key(|r| r.name);

        let mut registry = Self::new();
        for registration in builtins {
            registry.register(registration);
        }
        registry
    }

    /// Adds an entry. A later entry for the same exact type replaces the
    /// earlier one for exact lookups.
    pub fn register(&mut self, registration: ParserRegistration) {
        let index = self.entries.len();
        let types: Vec<TypeKey> = registration.types.iter().map(|f| f()).collect();

        for key in &types {
            if let Some(previous) = self.exact.insert(*key, index) {
                debug!(
                    parser = registration.name,
                    previous = self.entries[previous].registration.name,
                    ty = key.name(),
                    "Parser replaced"
                );
            }
        }

        trace!(parser = registration.name, types = ?types, "Parser registered");
        self.entries.push(Entry {
            registration,
            types,
        });
    }

    /// Finds the entry responsible for `ty`.
    pub fn lookup(&self, ty: &FieldType) -> ParseResult<&ParserRegistration> {
        if let Some(&index) = self.exact.get(&ty.lookup_key()) {
            return Ok(&self.entries[index].registration);
        }

        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.types.iter().any(|t| ty.bases().contains(t)))
            // Highest priority wins; on equal priority the lower index wins.
            .max_by_key(|(index, entry)| (entry.registration.priority, std::cmp::Reverse(*index)))
            .map(|(_, entry)| &entry.registration)
            .ok_or(ParseError::NoParser(ty.name()))
    }

    /// Builds a parser for `ty`, resolving type arguments recursively.
    pub fn get_parser(&self, ty: &FieldType) -> ParseResult<BoxedParser> {
        let registration = self.lookup(ty)?;
        (registration.factory)(ty, self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static REGISTRY: LazyLock<RwLock<ParserRegistry>> =
    LazyLock::new(|| RwLock::new(ParserRegistry::with_builtins()));

/// Adds an entry to the process-wide registry.
pub fn register_parser(registration: ParserRegistration) {
    REGISTRY.write().register(registration);
}

/// Builds a parser for `ty` from the process-wide registry.
pub fn get_parser(ty: &FieldType) -> ParseResult<BoxedParser> {
    REGISTRY.read().get_parser(ty)
}

/// Runs `f` with read access to the process-wide registry.
pub fn with_registry<R>(f: impl FnOnce(&ParserRegistry) -> R) -> R {
    f(&REGISTRY.read())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Dependencies;
    use crate::parser::{IntParser, Parser, ParserExt, StringParser};
    use crate::reflect::{Reflect, markers};

    enum Animal {}
    enum Dog {}

    const ANIMAL: &[fn() -> TypeKey] = &[TypeKey::of::<Animal>];

    fn dog_type() -> FieldType {
        FieldType::of::<Dog>().with_base::<Animal>()
    }

    fn low(_: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
        Ok(StringParser.boxed())
    }

    fn high(_: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
        Ok(IntParser::<i64>::new().boxed())
    }

    fn entry(name: &'static str, priority: i32, factory: ParserFactoryFn) -> ParserRegistration {
        ParserRegistration {
            name,
            types: ANIMAL,
            priority,
            factory,
        }
    }

    #[test]
    fn test_exact_match_wins() {
        let registry = ParserRegistry::with_builtins();
        let parser = registry.get_parser(&u32::field_type()).unwrap();
        assert_eq!(parser.target(), TypeKey::of::<u32>());
    }

    #[test]
    fn test_base_lookup_prefers_priority() {
        let mut registry = ParserRegistry::new();
        registry.register(entry("low", 0, low));
        registry.register(entry("high", 5, high));

        assert_eq!(registry.lookup(&dog_type()).unwrap().name, "high");
    }

    #[test]
    fn test_base_lookup_tie_goes_to_first_registered() {
        let mut registry = ParserRegistry::new();
        registry.register(entry("first", 1, low));
        registry.register(entry("second", 1, high));

        assert_eq!(registry.lookup(&dog_type()).unwrap().name, "first");
    }

    #[test]
    fn test_missing_parser() {
        let registry = ParserRegistry::with_builtins();
        let err = registry.lookup(&FieldType::of::<Dog>()).err().unwrap();
        assert!(matches!(err, ParseError::NoParser(name) if name.ends_with("Dog")));
    }

    #[tokio::test]
    async fn test_generic_resolves_arguments() {
        let registry = ParserRegistry::with_builtins();
        let ty = <Option<Vec<u16>>>::field_type();
        assert_eq!(ty.lookup_key(), TypeKey::of::<markers::OptionOf>());

        let parser = registry.get_parser(&ty).unwrap();
        let deps = Dependencies::new();
        let value = parser.loads_any("a,b", &deps).await.unwrap();
        assert_eq!(
            value.downcast_ref::<Option<Vec<u16>>>(),
            Some(&Some(vec![10, 11]))
        );

        // The inner type has no registration.
        let ty = FieldType::of::<Option<Dog>>()
            .with_origin::<markers::OptionOf>()
            .with_arg(FieldType::of::<Dog>());
        assert!(registry.get_parser(&ty).is_err());
    }

    #[tokio::test]
    async fn test_global_registry_accepts_new_entries() {
        enum Custom {}

        const CUSTOM: &[fn() -> TypeKey] = &[TypeKey::of::<Custom>];

        fn custom(_: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
            Ok(StringParser.boxed())
        }

        register_parser(ParserRegistration {
            name: "custom",
            types: CUSTOM,
            priority: 0,
            factory: custom,
        });

        let parser = get_parser(&FieldType::of::<Custom>()).unwrap();
        let token = parser.dumps_any(&String::from("x")).await.unwrap();
        assert_eq!(token, "x");
        assert_eq!(StringParser.dumps(&"y".into()).await.unwrap(), "y");
    }
}
