//! Procedural macros for the Compass component framework.
//!
//! This crate provides:
//!
//! - `#[derive(Component)]` - Declares a rich component's fields
//! - `#[derive(ParseEnum)]` - Encodes a fieldless enum by its discriminant
//!
//! Generated code refers to the `compass` facade crate, so these macros are
//! meant to be used through `compass::prelude`.
//!
//! ```rust,ignore
//! use compass::prelude::*;
//!
//! #[derive(Clone, Copy, ParseEnum)]
//! enum Colour {
//!     Red = 1,
//!     Green = 2,
//! }
//!
//! #[derive(Component)]
//! #[component(extends = button)]
//! struct Paint {
//!     #[component(internal)]
//!     label: Option<String>,
//!     colour: Colour,
//!     #[component(default = 1)]
//!     coats: u8,
//! }
//! ```

mod component;
mod parse_enum;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Implements `ComponentFields` for a struct with named fields.
///
/// # Struct attributes
///
/// - `#[component(extends = button)]` - Inherit the rich button template
/// - `#[component(extends = string_select)]` - Inherit the rich string select template
/// - `#[component(extends = path::To::Parent)]` - Inherit another derived component
/// - `#[component(render = path::to::render_fn)]` - Custom renderer taking
///   `(&dyn ComponentFields, String)`
/// - `#[component(template)]` - Mark the type as a template (never registered)
///
/// One of `extends` or `render` is required.
///
/// # Field attributes
///
/// - (none) - A custom-id field, required unless it has a default
/// - `#[component(internal)]` - Read back from the rendered platform component
/// - `#[component(plain)]` - Not encoded at all; always starts from its default
/// - `#[component(default)]` / `#[component(default = expr)]` - Default value
/// - `#[component(parser = expr)]` - Explicit parser for a custom-id field
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match component::derive_component(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Implements `ParseEnum` and `Reflect` for a fieldless enum.
///
/// Variants are encoded by their discriminant, explicit or implicit.
#[proc_macro_derive(ParseEnum)]
pub fn derive_parse_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match parse_enum::derive_parse_enum(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
