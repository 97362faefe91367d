//! # Compass Framework
//!
//! Stateful message components whose state lives in their custom id.
//!
//! This layer provides:
//! - Parsers that encode typed fields as short string tokens, looked up by
//!   type through a process-wide registry
//! - The component declaration pipeline (`ComponentSpec` to
//!   `ComponentType`) and per-type factories
//! - Hierarchical component managers that build and decode custom ids and
//!   dispatch interactions through dependency, wrapper and error hooks
//!
//! Platform types come from `compass-core`; `#[derive(Component)]` lives in
//! `compass-macros` and is re-exported by the `compass` facade.

pub mod component;
pub mod di;
pub mod error;
pub mod factory;
pub mod manager;
pub mod modules;
pub mod parser;
pub mod reflect;

#[cfg(test)]
mod testing;

pub use component::{
    ComponentFields, ComponentSpec, ComponentType, FieldDecl, FieldKind, FieldValues,
    RichComponent, template,
};
pub use di::Dependencies;
pub use error::{
    DefinitionError, DefinitionResult, LookupError, ManagerError, ManagerResult, ParseError,
    ParseResult,
};
pub use factory::{ComponentFactory, Factory, NoopFactory, is_absent_token};
pub use manager::{
    CallbackWrapper, ComponentManager, DependencyProvider, ExceptionHandler, ManagerStore,
    RequestScope, RichSlot, check_manager, current_custom_id, get_manager, is_dedup_char,
    resolve,
};
pub use modules::{ModuleStamp, is_live, load_module, reload_module, unload_module};
pub use parser::{BoxedParser, ErasedParser, Parser, ParserExt, get_parser, register_parser};
pub use reflect::{Either, FieldType, FromSnowflake, ParseEnum, Reflect, TypeKey};

#[doc(hidden)]
pub use linkme;
