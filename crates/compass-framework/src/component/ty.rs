//! The declaration pipeline: merges a spec with its parents, resolves
//! parsers and builds the factory.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use compass_core::Component;
use parking_lot::RwLock;
use tracing::debug;

use super::field::{FieldDecl, FieldKind, FieldValues};
use super::spec::ComponentSpec;
use super::RichComponent;
use crate::error::{DefinitionError, DefinitionResult};
use crate::factory::{BuildFn, ComponentFactory, Factory, NoopFactory};
use crate::parser::get_parser;
use crate::reflect::TypeKey;

static TYPES: LazyLock<RwLock<HashMap<TypeId, Arc<ComponentType>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A finalized component type: its full field list and its factory.
pub struct ComponentType {
    name: &'static str,
    module: &'static str,
    key: Option<TypeKey>,
    template: bool,
    fields: Vec<FieldDecl>,
    factory: Arc<dyn Factory>,
}

impl ComponentType {
    /// Finalizes `T`, caching the result for the life of the process.
    pub fn of<T: RichComponent>() -> DefinitionResult<Arc<Self>> {
        let id = TypeId::of::<T>();
        if let Some(ty) = TYPES.read().get(&id) {
            return Ok(ty.clone());
        }

        let build: BuildFn = |values| {
            let component = T::from_fields(values)?;
            Ok(Box::new(component) as Box<dyn RichComponent>)
        };
        let ty = Arc::new(Self::from_spec(
            T::declare(),
            Some(TypeKey::of::<T>()),
            build,
        )?);
        Ok(TYPES.write().entry(id).or_insert(ty).clone())
    }

    /// Runs the pipeline on a spec without caching it.
    pub fn from_spec(
        spec: ComponentSpec,
        key: Option<TypeKey>,
        build: BuildFn,
    ) -> DefinitionResult<Self> {
        let mut fields = merge_fields(&spec)?;

        let factory: Arc<dyn Factory> = if spec.template {
            Arc::new(NoopFactory)
        } else {
            check_declared(&spec, &fields)?;
            resolve_parsers(spec.name, &mut fields)?;
            Arc::new(ComponentFactory::new(spec.name, &fields, build))
        };

        debug!(
            component = spec.name,
            module = spec.module,
            fields = fields.len(),
            template = spec.template,
            "Component type finalized"
        );

        Ok(Self {
            name: spec.name,
            module: spec.module,
            key,
            template: spec.template,
            fields,
            factory,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    /// The Rust type, if the descriptor was built from one.
    pub fn key(&self) -> Option<TypeKey> {
        self.key
    }

    pub fn is_template(&self) -> bool {
        self.template
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn custom_id_fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields_of(FieldKind::CustomId)
    }

    pub fn internal_fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields_of(FieldKind::Internal)
    }

    fn fields_of(&self, kind: FieldKind) -> impl Iterator<Item = &FieldDecl> {
        self.fields.iter().filter(move |f| f.kind == kind)
    }

    pub fn factory(&self) -> &Arc<dyn Factory> {
        &self.factory
    }

    /// Reads every internal field that has an extractor from `component`.
    pub fn extract_internal(&self, component: &Component) -> FieldValues {
        let mut values = FieldValues::new();
        for field in self.internal_fields() {
            if let Some(value) = field.extract.and_then(|extract| extract(component)) {
                values.insert(field.name, value);
            }
        }
        values
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("template", &self.template)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Parent fields first, in their original positions, then new fields.
fn merge_fields(spec: &ComponentSpec) -> DefinitionResult<Vec<FieldDecl>> {
    let mut fields = match &spec.parent {
        Some(parent) => merge_fields(parent)?,
        None => Vec::new(),
    };

    for decl in &spec.fields {
        let Some(index) = fields.iter().position(|f| f.name == decl.name) else {
            fields.push(decl.clone());
            continue;
        };

        let inherited = &fields[index];
        if inherited.kind != decl.kind {
            return Err(DefinitionError::KindMismatch {
                component: spec.name,
                field: decl.name,
                kind: decl.kind.as_str(),
                parent_kind: inherited.kind.as_str(),
            });
        }

        let same_type = inherited.ty.key() == decl.ty.key();
        if decl.kind == FieldKind::Internal && !same_type {
            return Err(DefinitionError::FieldTypeMismatch {
                component: spec.name,
                field: decl.name,
                field_type: decl.ty.name(),
                parent_type: inherited.ty.name(),
            });
        }

        let mut merged = decl.clone();
        if merged.parser.is_none() && same_type {
            merged.parser = inherited.parser.clone();
        }
        if merged.extract.is_none() {
            merged.extract = inherited.extract;
        }
        fields[index] = merged;
    }

    Ok(fields)
}

/// Every custom-id field of a concrete type must be one of its own fields:
/// inherited declarations describe the layout, not the instance.
fn check_declared(spec: &ComponentSpec, fields: &[FieldDecl]) -> DefinitionResult<()> {
    let undeclared = fields
        .iter()
        .filter(|f| f.is_custom_id())
        .find(|f| !spec.fields.iter().any(|own| own.name == f.name));

    match (undeclared, &spec.parent) {
        (Some(field), Some(parent)) => Err(DefinitionError::UndeclaredField {
            component: spec.name,
            field: field.name,
            parent: parent.name,
        }),
        _ => Ok(()),
    }
}

fn resolve_parsers(component: &'static str, fields: &mut [FieldDecl]) -> DefinitionResult<()> {
    for field in fields.iter_mut().filter(|f| f.is_custom_id()) {
        let parser = match field.parser.take() {
            Some(parser) => parser,
            None => get_parser(&field.ty).map_err(|source| DefinitionError::UnresolvedParser {
                component,
                field: field.name,
                source,
            })?,
        };

        if parser.target() != field.ty.key() {
            return Err(DefinitionError::ParserTypeMismatch {
                component,
                field: field.name,
                parser: parser.target().name(),
                field_type: field.ty.name(),
            });
        }
        field.parser = Some(parser);
    }
    Ok(())
}
