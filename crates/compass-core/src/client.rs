//! The platform client consumed by the framework.
//!
//! A [`Client`] exposes the object caches, fetch-by-id calls and message
//! operations the component core needs. Everything else about the platform
//! (gateway, sharding, HTTP) stays behind the implementation.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::component::Component;
use crate::error::{ListenerError, PlatformError, PlatformResult};
use crate::interaction::Interaction;
use crate::model::{
    Channel, Emoji, Guild, Invite, Member, Message, Role, Snowflake, Sticker, User,
};

/// Event name for interactions on message components.
pub const MESSAGE_INTERACTION_EVENT: &str = "on_message_interaction";

/// Message body for send and edit operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePayload {
    pub content: Option<String>,
    pub components: Vec<Component>,
}

impl MessagePayload {
    pub fn components(components: Vec<Component>) -> Self {
        Self {
            content: None,
            components,
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// What to include when fetching an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InviteQuery {
    pub with_counts: bool,
    pub with_expiration: bool,
    pub scheduled_event_id: Option<Snowflake>,
}

impl Default for InviteQuery {
    fn default() -> Self {
        Self {
            with_counts: true,
            with_expiration: true,
            scheduled_event_id: None,
        }
    }
}

/// A connected platform client.
///
/// Cache getters are synchronous and return `None` on a miss. Fetches go to
/// the network and report a missing object as [`PlatformError::NotFound`].
/// All methods except [`listeners`](Client::listeners) have defaults so test
/// doubles only implement what they use.
#[async_trait]
pub trait Client: Send + Sync + 'static {
    /// Listener registry that incoming events are dispatched through.
    fn listeners(&self) -> &Listeners;

    fn get_user(&self, _id: Snowflake) -> Option<User> {
        None
    }

    fn get_guild(&self, _id: Snowflake) -> Option<Guild> {
        None
    }

    fn get_channel(&self, _id: Snowflake) -> Option<Channel> {
        None
    }

    fn get_member(&self, _guild: Snowflake, _id: Snowflake) -> Option<Member> {
        None
    }

    fn get_role(&self, _guild: Snowflake, _id: Snowflake) -> Option<Role> {
        None
    }

    fn get_message(&self, _id: Snowflake) -> Option<Message> {
        None
    }

    fn get_emoji(&self, _id: Snowflake) -> Option<Emoji> {
        None
    }

    fn get_sticker(&self, _id: Snowflake) -> Option<Sticker> {
        None
    }

    async fn fetch_user(&self, _id: Snowflake) -> PlatformResult<User> {
        Err(PlatformError::Unsupported("fetch_user"))
    }

    async fn fetch_guild(&self, _id: Snowflake) -> PlatformResult<Guild> {
        Err(PlatformError::Unsupported("fetch_guild"))
    }

    async fn fetch_channel(&self, _id: Snowflake) -> PlatformResult<Channel> {
        Err(PlatformError::Unsupported("fetch_channel"))
    }

    async fn fetch_member(&self, _guild: Snowflake, _id: Snowflake) -> PlatformResult<Member> {
        Err(PlatformError::Unsupported("fetch_member"))
    }

    async fn fetch_role(&self, _guild: Snowflake, _id: Snowflake) -> PlatformResult<Role> {
        Err(PlatformError::Unsupported("fetch_role"))
    }

    async fn fetch_message(&self, _channel: Snowflake, _id: Snowflake) -> PlatformResult<Message> {
        Err(PlatformError::Unsupported("fetch_message"))
    }

    async fn fetch_emoji(&self, _guild: Snowflake, _id: Snowflake) -> PlatformResult<Emoji> {
        Err(PlatformError::Unsupported("fetch_emoji"))
    }

    async fn fetch_sticker(&self, _id: Snowflake) -> PlatformResult<Sticker> {
        Err(PlatformError::Unsupported("fetch_sticker"))
    }

    async fn fetch_invite(&self, _code: &str, _query: InviteQuery) -> PlatformResult<Invite> {
        Err(PlatformError::Unsupported("fetch_invite"))
    }

    async fn send_message(
        &self,
        _channel: Snowflake,
        _payload: MessagePayload,
    ) -> PlatformResult<Message> {
        Err(PlatformError::Unsupported("send_message"))
    }

    async fn edit_message(
        &self,
        _channel: Snowflake,
        _message: Snowflake,
        _payload: MessagePayload,
    ) -> PlatformResult<Message> {
        Err(PlatformError::Unsupported("edit_message"))
    }

    /// Returns self as `Any` for downcasting to the concrete client.
    fn as_any(&self) -> &dyn Any;
}

/// Type-erased, shared client handle.
pub type BoxedClient = Arc<dyn Client>;

// =============================================================================
// Listeners
// =============================================================================

/// A type-erased event listener.
pub type ListenerFn = Arc<dyn Fn(Interaction) -> BoxFuture<'static, ()> + Send + Sync>;

/// Converts an async closure into a [`ListenerFn`].
pub fn into_listener<F, Fut>(f: F) -> ListenerFn
where
    F: Fn(Interaction) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    Arc::new(move |interaction| Box::pin(f(interaction)))
}

/// Keyed event listeners, at most one per key and event.
#[derive(Default)]
pub struct Listeners {
    events: RwLock<HashMap<String, Vec<(String, ListenerFn)>>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a listener. A second listener under the same key is rejected.
    pub fn add(
        &self,
        event: &str,
        key: impl Into<String>,
        listener: ListenerFn,
    ) -> Result<(), ListenerError> {
        let key = key.into();
        let mut events = self.events.write();
        let entries = events.entry(event.to_string()).or_default();

        if entries.iter().any(|(k, _)| *k == key) {
            return Err(ListenerError::AlreadyRegistered {
                event: event.to_string(),
                key,
            });
        }

        debug!(event, key = %key, "Listener added");
        entries.push((key, listener));
        Ok(())
    }

    /// Detaches a listener.
    pub fn remove(&self, event: &str, key: &str) -> Result<(), ListenerError> {
        let mut events = self.events.write();
        let entries = events.get_mut(event);

        let Some(entries) = entries else {
            return Err(ListenerError::NotRegistered {
                event: event.to_string(),
                key: key.to_string(),
            });
        };

        let before = entries.len();
        entries.retain(|(k, _)| k != key);
        if entries.len() == before {
            return Err(ListenerError::NotRegistered {
                event: event.to_string(),
                key: key.to_string(),
            });
        }

        debug!(event, key, "Listener removed");
        Ok(())
    }

    pub fn contains(&self, event: &str, key: &str) -> bool {
        self.events
            .read()
            .get(event)
            .is_some_and(|entries| entries.iter().any(|(k, _)| k == key))
    }

    pub fn len(&self, event: &str) -> usize {
        self.events.read().get(event).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().values().all(Vec::is_empty)
    }

    /// Runs every listener attached to `event`, in attachment order.
    pub async fn dispatch(&self, event: &str, interaction: Interaction) {
        // Snapshot so listeners may add or remove listeners while running.
        let listeners: Vec<ListenerFn> = self
            .events
            .read()
            .get(event)
            .map(|entries| entries.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        trace!(event, count = listeners.len(), "Dispatching to listeners");
        for listener in listeners {
            listener(interaction.clone()).await;
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events = self.events.read();
        let mut map = f.debug_map();
        for (event, entries) in events.iter() {
            let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
            map.entry(event, &keys);
        }
        map.finish()
    }
}


impl std::fmt::Debug for dyn Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}
