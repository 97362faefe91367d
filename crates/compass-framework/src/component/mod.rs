//! Rich components: user types that encode their state into a custom id.
//!
//! A rich component is a plain struct. `#[derive(Component)]` implements
//! [`ComponentFields`] for it; the user implements [`RichComponent`] to give
//! it a callback. The declaration is turned into a resolved
//! [`ComponentType`] (field list plus factory) the first time the type is
//! registered or encoded.
//!
//! # Example
//!
//! ```rust,ignore
//! use compass::prelude::*;
//!
//! #[derive(Component)]
//! #[component(extends = button)]
//! struct Counter {
//!     #[component(internal)]
//!     label: Option<String>,
//!     count: i64,
//! }
//!
//! #[async_trait]
//! impl RichComponent for Counter {
//!     async fn callback(&mut self, interaction: &Interaction) -> anyhow::Result<()> {
//!         self.count += 1;
//!         Ok(())
//!     }
//! }
//! ```

mod field;
mod spec;
pub mod template;
mod ty;

use std::any::Any;

use async_trait::async_trait;
use compass_core::{Component, Interaction};

use crate::error::ParseResult;
use crate::reflect::{DynValue, TypeKey};

pub use field::{Extractor, FieldDecl, FieldKind, FieldValues};
pub use spec::ComponentSpec;
pub use ty::ComponentType;

/// Field access and construction for a component type.
///
/// Usually derived. The `Sized` methods describe the type; the others give
/// the manager type-erased access to an instance.
pub trait ComponentFields: Send + Sync + 'static {
    /// The type's own declaration, including its parent's.
    fn declare() -> ComponentSpec
    where
        Self: Sized;

    /// Builds an instance from decoded values; absent values take defaults.
    fn from_fields(values: FieldValues) -> ParseResult<Self>
    where
        Self: Sized;

    /// Renders any instance whose fields follow this type's layout.
    fn render(component: &dyn ComponentFields, custom_id: String) -> Component
    where
        Self: Sized;

    /// Borrows a field by name.
    fn field(&self, name: &str) -> Option<&DynValue>;

    /// Renders this instance as a platform component with `custom_id`.
    fn as_ui_component(&self, custom_id: String) -> Component;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Self>()
    }
}

/// A component with a callback, ready to be registered on a manager.
#[async_trait]
pub trait RichComponent: ComponentFields {
    /// Runs when a user interacts with the rendered component.
    async fn callback(&mut self, interaction: &Interaction) -> anyhow::Result<()>;
}

impl dyn RichComponent {
    pub fn is<T: RichComponent>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: RichComponent>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: RichComponent>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl std::fmt::Debug for dyn RichComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RichComponent").finish_non_exhaustive()
    }
}
