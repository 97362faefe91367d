//! Error types for the Compass framework.
//!
//! Errors fall into three groups:
//!
//! - [`DefinitionError`]: a component type or registration is invalid. These
//!   surface when a type is finalized or registered, i.e. at startup.
//! - [`ParseError`]: a custom id or one of its tokens could not be decoded
//!   or encoded. Reference lookups that miss are wrapped [`LookupError`]s.
//! - [`ManagerError`]: runtime manager operations, wrapping the two above.

use compass_core::{ListenerError, PlatformError, Snowflake};
use thiserror::Error;

// =============================================================================
// Lookup Errors
// =============================================================================

/// A reference parser could not resolve its target.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The object exists nowhere: not injected, not cached, not fetchable.
    #[error("could not find {kind} with id {id}")]
    NotFound {
        /// The kind of object, e.g. `"channel"`.
        kind: &'static str,
        /// The id that was looked up.
        id: Snowflake,
    },

    /// A dependency needed for the lookup is not available.
    #[error("dependency '{0}' is not available in this context")]
    MissingDependency(&'static str),
}

impl LookupError {
    pub fn not_found(kind: &'static str, id: Snowflake) -> Self {
        Self::NotFound { kind, id }
    }
}

// =============================================================================
// Parse Errors
// =============================================================================

/// Errors raised while loading or dumping custom-id tokens.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// A token is not valid for the target type.
    #[error("malformed token '{token}' for {target}: {reason}")]
    Malformed {
        /// The offending token.
        token: String,
        /// Name of the target type.
        target: &'static str,
        /// Why the token was rejected.
        reason: String,
    },

    /// A value had a different type than the parser expects.
    #[error("type mismatch: expected '{expected}', got '{got}'")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        got: &'static str,
    },

    /// A referenced object could not be resolved.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The number of tokens differs from the number of custom-id fields.
    #[error("component parameter count mismatch: expected {expected}, got {got}")]
    ParamCount {
        /// Number of custom-id fields.
        expected: usize,
        /// Number of tokens received.
        got: usize,
    },

    /// A required field has no value.
    #[error("missing value for field '{0}'")]
    MissingField(String),

    /// A dumped token contains a reserved separator.
    #[error("dumped value '{token}' for field '{field}' contains separator '{sep}'")]
    ContainsSeparator {
        /// Field name or collection item position.
        field: String,
        /// The dumped token.
        token: String,
        /// The reserved separator.
        sep: String,
    },

    /// No registered parser handles the type.
    #[error("no parser available for type '{0}'")]
    NoParser(&'static str),

    /// The operation is not available, e.g. on a template factory.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// A platform call failed for a reason other than a missing object.
    #[error(transparent)]
    Platform(PlatformError),
}

impl ParseError {
    /// Creates a malformed-token error.
    pub fn malformed(token: &str, target: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            token: token.to_string(),
            target,
            reason: reason.into(),
        }
    }

    /// Creates a type-mismatch error for `T`.
    pub fn type_mismatch<T: ?Sized>(got: &'static str) -> Self {
        Self::TypeMismatch {
            expected: std::any::type_name::<T>(),
            got,
        }
    }

    /// Returns `true` if a referenced object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Lookup(LookupError::NotFound { .. }))
    }
}

/// Result type for parser and factory operations.
pub type ParseResult<T> = Result<T, ParseError>;

// =============================================================================
// Definition Errors
// =============================================================================

/// A component type or registration is invalid.
#[derive(Debug, Clone, Error)]
pub enum DefinitionError {
    /// A custom-id field of a concrete component has no parser.
    #[error("no parser for field '{field}' of component '{component}': {source}")]
    UnresolvedParser {
        component: &'static str,
        field: &'static str,
        #[source]
        source: ParseError,
    },

    /// An explicit parser produces a different type than the field holds.
    #[error(
        "parser for field '{field}' of component '{component}' produces '{parser}', expected '{field_type}'"
    )]
    ParserTypeMismatch {
        component: &'static str,
        field: &'static str,
        parser: &'static str,
        field_type: &'static str,
    },

    /// An overriding field changed its kind.
    #[error(
        "field '{field}' of component '{component}' is declared as {kind} but overrides a {parent_kind} field"
    )]
    KindMismatch {
        component: &'static str,
        field: &'static str,
        kind: &'static str,
        parent_kind: &'static str,
    },

    /// A concrete component inherits a custom-id field without declaring
    /// it, so its instances have no value to encode.
    #[error(
        "component '{component}' inherits custom-id field '{field}' from '{parent}' but does not declare it"
    )]
    UndeclaredField {
        component: &'static str,
        field: &'static str,
        parent: &'static str,
    },

    /// An overriding internal field changed its type.
    #[error(
        "internal field '{field}' of component '{component}' has type '{field_type}' but overrides '{parent_type}'"
    )]
    FieldTypeMismatch {
        component: &'static str,
        field: &'static str,
        field_type: &'static str,
        parent_type: &'static str,
    },

    /// The identifier is already taken by a component from another module.
    #[error(
        "identifier '{identifier}' from module '{duplicate_module}' is already registered by module '{original_module}'"
    )]
    DuplicateIdentifier {
        identifier: String,
        original_module: String,
        duplicate_module: String,
    },

    /// The identifier cannot be encoded unambiguously.
    #[error("invalid identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    /// Templates have no factory and cannot be registered.
    #[error("component '{0}' is a template and cannot be registered")]
    TemplateRegistration(&'static str),
}

impl DefinitionError {
    pub fn invalid_identifier(identifier: &str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for component definition.
pub type DefinitionResult<T> = Result<T, DefinitionError>;

// =============================================================================
// Manager Errors
// =============================================================================

/// Errors raised by [`ComponentManager`](crate::ComponentManager) operations.
#[derive(Debug, Clone, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// The component type has not been registered on this manager.
    #[error("component '{component}' is not registered on manager '{manager}'")]
    NotRegistered {
        component: &'static str,
        manager: String,
    },

    /// No component is registered under this identifier.
    #[error("no component registered as '{identifier}' on manager '{manager}'")]
    UnknownIdentifier { identifier: String, manager: String },

    /// The assembled custom id exceeds the platform limit.
    #[error("custom id '{custom_id}' is {length} characters long, the limit is {limit}")]
    CustomIdTooLong {
        custom_id: String,
        length: usize,
        limit: usize,
    },

    /// The separator would be confused with a dedup counter character.
    #[error("separator {sep:?} on manager '{manager}' contains a dedup counter character")]
    InvalidSeparator { sep: String, manager: String },

    /// Neither this manager nor any ancestor is bound to a client.
    #[error("manager '{0}' is not bound to a client")]
    NotBound(String),

    /// This manager is already bound to a client.
    #[error("manager '{0}' is already bound to a client")]
    AlreadyBound(String),
}

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        let err: ParseError = LookupError::not_found("user", Snowflake(7)).into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "could not find user with id 7");

        let err: ParseError = LookupError::MissingDependency("client").into();
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_param_count_message() {
        let err = ParseError::ParamCount {
            expected: 2,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "component parameter count mismatch: expected 2, got 3"
        );
    }

    #[test]
    fn test_duplicate_identifier_names_both_modules() {
        let err = DefinitionError::DuplicateIdentifier {
            identifier: "MyButton".into(),
            original_module: "bot::a".into(),
            duplicate_module: "bot::b".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("bot::a") && msg.contains("bot::b"));
    }
}
