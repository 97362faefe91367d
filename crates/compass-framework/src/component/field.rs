//! Field declarations and decoded field values.

use std::collections::HashMap;
use std::fmt;

use compass_core::Component;

use crate::error::{ParseError, ParseResult};
use crate::parser::BoxedParser;
use crate::reflect::{AnyValue, FieldType, Reflect, downcast};

/// How a field takes part in encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Encoded into the custom id, in declaration order.
    CustomId,
    /// Read back from the raw platform component (label, style, ...).
    Internal,
    /// Neither encoded nor extracted; always starts from its default.
    Plain,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomId => "custom id",
            Self::Internal => "internal",
            Self::Plain => "plain",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads an internal field's value out of a raw platform component.
pub type Extractor = fn(&Component) -> Option<AnyValue>;

/// A declared field. Resolved fields share the same shape, with the parser
/// and extractor filled in by the declaration pipeline.
#[derive(Clone)]
pub struct FieldDecl {
    pub name: &'static str,
    pub kind: FieldKind,
    pub ty: FieldType,
    pub parser: Option<BoxedParser>,
    pub extract: Option<Extractor>,
    /// Whether construction fails when no value is supplied.
    pub required: bool,
}

impl FieldDecl {
    fn new(name: &'static str, kind: FieldKind, ty: FieldType) -> Self {
        Self {
            name,
            kind,
            ty,
            parser: None,
            extract: None,
            required: false,
        }
    }

    /// A field stored in the custom id. Required unless it has a default.
    pub fn custom_id<T: Reflect>(name: &'static str) -> Self {
        Self::new(name, FieldKind::CustomId, T::field_type()).required(true)
    }

    pub fn internal<T: Send + Sync + 'static>(name: &'static str) -> Self {
        Self::new(name, FieldKind::Internal, FieldType::of::<T>())
    }

    pub fn plain<T: Send + Sync + 'static>(name: &'static str) -> Self {
        Self::new(name, FieldKind::Plain, FieldType::of::<T>())
    }

    /// Overrides the registry lookup for this field.
    pub fn parser(mut self, parser: BoxedParser) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn extract(mut self, extract: Extractor) -> Self {
        self.extract = Some(extract);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn is_custom_id(&self) -> bool {
        self.kind == FieldKind::CustomId
    }
}

impl fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDecl")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("ty", &self.ty.key())
            .field("parser", &self.parser.as_ref().map(|p| p.target()))
            .field("required", &self.required)
            .finish()
    }
}

/// Decoded field values, handed to [`ComponentFields::from_fields`].
///
/// Absent entries mean "use the default".
///
/// [`ComponentFields::from_fields`]: super::ComponentFields::from_fields
#[derive(Default)]
pub struct FieldValues {
    values: HashMap<&'static str, AnyValue>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: AnyValue) {
        self.values.insert(name, value);
    }

    pub fn with<T: Send + Sync + 'static>(mut self, name: &'static str, value: T) -> Self {
        self.insert(name, Box::new(value));
        self
    }

    /// Removes a value, failing if it has another type.
    pub fn take<T: 'static>(&mut self, name: &str) -> ParseResult<Option<T>> {
        self.values.remove(name).map(downcast::<T>).transpose()
    }

    /// Like [`take`](Self::take), failing with `MissingField` when absent.
    pub fn require<T: 'static>(&mut self, name: &str) -> ParseResult<T> {
        self.take::<T>(name)?
            .ok_or_else(|| ParseError::MissingField(name.to_string()))
    }

    pub fn extend(&mut self, other: FieldValues) {
        self.values.extend(other.values);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for FieldValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_checks_type() {
        let mut values = FieldValues::new().with("count", 5i64).with("name", "x".to_string());
        assert_eq!(values.take::<i64>("count").unwrap(), Some(5));
        assert_eq!(values.take::<i64>("count").unwrap(), None);

        let err = values.take::<i64>("name").unwrap_err();
        assert!(matches!(err, ParseError::TypeMismatch { .. }));
    }

    #[test]
    fn test_require_reports_missing_field() {
        let mut values = FieldValues::new();
        let err = values.require::<bool>("flag").unwrap_err();
        assert!(matches!(err, ParseError::MissingField(name) if name == "flag"));
    }

    #[test]
    fn test_custom_id_fields_default_to_required() {
        assert!(FieldDecl::custom_id::<u8>("a").required);
        assert!(!FieldDecl::internal::<u8>("b").required);
        assert_eq!(FieldDecl::plain::<u8>("c").kind, FieldKind::Plain);
    }
}
