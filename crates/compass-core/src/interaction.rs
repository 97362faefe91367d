//! Incoming component interactions.

use std::fmt;

use crate::client::{BoxedClient, MessagePayload};
use crate::component::{Component, ComponentKind, find_by_custom_id};
use crate::error::{PlatformError, PlatformResult};
use crate::model::{Channel, Guild, Member, Message, Snowflake, User};

/// Raw component payload of an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentData {
    pub kind: ComponentKind,
    pub custom_id: String,
    /// Selected values for selects; empty for buttons.
    pub values: Vec<String>,
}

/// A user interacting with a message component.
#[derive(Clone)]
pub struct Interaction {
    pub id: Snowflake,
    pub author: User,
    pub member: Option<Member>,
    pub guild: Option<Guild>,
    pub channel: Channel,
    pub message: Option<Message>,
    pub data: Option<ComponentData>,
    pub client: BoxedClient,
}

impl Interaction {
    pub fn builder(author: User, channel: Channel, client: BoxedClient) -> InteractionBuilder {
        InteractionBuilder {
            inner: Interaction {
                id: Snowflake(0),
                author,
                member: None,
                guild: None,
                channel,
                message: None,
                data: None,
                client,
            },
        }
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.custom_id.as_str())
    }

    pub fn values(&self) -> &[String] {
        self.data
            .as_ref()
            .map(|d| d.values.as_slice())
            .unwrap_or_default()
    }

    /// The component on the message that triggered this interaction.
    ///
    /// Returns `None` when the payload has no custom id or the message is
    /// not attached.
    pub fn component(&self) -> Option<&Component> {
        let custom_id = self.custom_id()?;
        let message = self.message.as_ref()?;
        find_by_custom_id(&message.components, custom_id)
    }

    /// Replaces the components of the message this interaction came from.
    pub async fn edit_components(&self, components: Vec<Component>) -> PlatformResult<Message> {
        let Some(message) = &self.message else {
            return Err(PlatformError::request("interaction has no source message"));
        };
        let message_id = message.id;
        self.client
            .edit_message(
                self.channel.id,
                message_id,
                MessagePayload::components(components),
            )
            .await
    }
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("id", &self.id)
            .field("author", &self.author.id)
            .field("guild", &self.guild.as_ref().map(|g| g.id))
            .field("channel", &self.channel.id)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Interaction`], mostly used by adapters and tests.
pub struct InteractionBuilder {
    inner: Interaction,
}

impl InteractionBuilder {
    pub fn id(mut self, id: impl Into<Snowflake>) -> Self {
        self.inner.id = id.into();
        self
    }

    pub fn guild(mut self, guild: Guild) -> Self {
        self.inner.guild = Some(guild);
        self
    }

    pub fn member(mut self, member: Member) -> Self {
        self.inner.member = Some(member);
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.inner.message = Some(message);
        self
    }

    /// Sets the component payload from the triggering component itself.
    pub fn component(mut self, component: &Component, values: Vec<String>) -> Self {
        if let (Some(kind), Some(custom_id)) = (component.kind(), component.custom_id()) {
            self.inner.data = Some(ComponentData {
                kind,
                custom_id: custom_id.to_string(),
                values,
            });
        }
        self
    }

    pub fn data(mut self, data: ComponentData) -> Self {
        self.inner.data = Some(data);
        self
    }

    pub fn build(self) -> Interaction {
        self.inner
    }
}
