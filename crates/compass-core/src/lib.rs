//! # Compass Core
//!
//! The platform model of the Compass component framework.
//!
//! This crate describes everything the component core consumes from the chat
//! platform, without implementing any of it:
//!
//! - **Objects**: ids and entities ([`Snowflake`], [`User`], [`Guild`], ...)
//! - **Components**: the UI tree attached to messages ([`Component`])
//! - **Interactions**: a user clicking or selecting ([`Interaction`])
//! - **Client**: caches, fetches, message edits and event listeners ([`Client`])
//!
//! Adapters for a concrete platform implement [`Client`] and feed
//! [`Interaction`]s into the client's [`Listeners`].
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌──────────────────┐
//! │   Platform  │────▶│ Listeners  │────▶│ ComponentManager │
//! │  (Adapter)  │     │ (by event) │     │   (framework)    │
//! └─────────────┘     └────────────┘     └──────────────────┘
//! ```

pub mod client;
pub mod component;
pub mod error;
pub mod interaction;
pub mod model;

pub use client::{
    BoxedClient, Client, InviteQuery, ListenerFn, Listeners, MESSAGE_INTERACTION_EVENT,
    MessagePayload, into_listener,
};
pub use component::{
    ActionRow, Button, ButtonStyle, Component, ComponentKind, Container, Section, SelectOption,
    Separator, StringSelect, TextDisplay, find_by_custom_id, interactive_components,
    interactive_components_mut, walk_components,
};
pub use error::{ListenerError, PlatformError, PlatformResult};
pub use interaction::{ComponentData, Interaction, InteractionBuilder};
pub use model::{
    Channel, ChannelKind, Emoji, Entity, Guild, Invite, Member, Message, Object, PartialEmoji,
    PartialMessage, Role, Snowflake, Sticker, User,
};
