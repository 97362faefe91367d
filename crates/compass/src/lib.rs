//! # Compass
//!
//! Stateful message components for chat bots, with the state encoded in
//! the component's custom id instead of held in memory.
//!
//! ## Overview
//!
//! A rich component is a struct whose fields are split into three kinds:
//!
//! - **custom-id** fields are encoded, in order, after the component's
//!   identifier: `Counter|1z|2`.
//! - **internal** fields (label, style, options, ...) live on the rendered
//!   platform component and are read back from it.
//! - **plain** fields are never stored and start from their default.
//!
//! When a user clicks, the manager bound to the client parses the custom id
//! back into the struct and runs its callback. Nothing survives between
//! interactions except what was rendered, so bots can restart freely.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐ interaction ┌──────────────────┐ decode ┌───────────────┐
//! │ Client │────────────▶│ ComponentManager │───────▶│ RichComponent │──▶ callback
//! └────────┘             │  root ▸ a ▸ a.b   │◀───────│   (struct)    │
//!                        └──────────────────┘ encode └───────────────┘
//! ```
//!
//! - **core**: platform model (components, interactions, client trait)
//! - **framework**: parsers, component declarations, managers and dispatch
//! - **runtime**: configuration, logging and client binding
//!
//! ## Quick Start
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
//!         let manager = get_manager(None);
//!         let button = manager.render(self).await?;
//!         interaction.edit_components(vec![Component::row([button])]).await?;
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let runtime = CompassRuntime::new();
//!     runtime.root().register::<Counter>()?;
//!     runtime.bind(client)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: read `compass.toml`
//! - `yaml-config`: read `compass.yaml`
//! - `json-log`: JSON log output

pub use compass_core as core;
pub use compass_framework as framework;
pub use compass_runtime as runtime;

pub use compass_macros::{Component, ParseEnum};

/// Everything needed to declare, register and render components.
///
/// ```rust,ignore
/// use compass::prelude::*;
/// ```
pub mod prelude {
    pub use async_trait::async_trait;

    // Derives
    pub use compass_macros::{Component, ParseEnum};

    // Runtime
    pub use compass_runtime::CompassRuntime;

    // Declaring components
    pub use compass_framework::{
        ComponentFields, FieldType, FromSnowflake, ParseEnum, Reflect, RichComponent,
    };

    // Managers and dispatch
    pub use compass_framework::{
        CallbackWrapper, ComponentManager, DependencyProvider, ExceptionHandler, RichSlot,
        check_manager, current_custom_id, get_manager, resolve,
    };

    // Parsers
    pub use compass_framework::{Parser, ParserExt, register_parser};

    // Platform types
    pub use compass_core::{
        Button, ButtonStyle, Client, Component, Interaction, PartialEmoji, SelectOption,
        Snowflake, StringSelect,
    };
}
