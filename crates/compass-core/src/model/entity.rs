//! Platform objects that components can reference by id.

use serde::{Deserialize, Serialize};

use super::Snowflake;
use crate::component::Component;

/// Anything with a platform id.
pub trait Entity {
    /// Short lowercase name used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> Snowflake;
}

macro_rules! impl_entity {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: &'static str = $kind;

                fn id(&self) -> Snowflake {
                    self.id
                }
            }
        )*
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

/// A user in the context of one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    pub guild_id: Snowflake,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
}

impl Member {
    /// Nickname if set, otherwise the user name.
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.user.name)
    }
}

impl Entity for Member {
    const KIND: &'static str = "member";

    fn id(&self) -> Snowflake {
        self.user.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    Text,
    Voice,
    Thread,
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub name: String,
    #[serde(default)]
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Message {
    /// A reference to this message that keeps only what is needed to
    /// address it.
    pub fn to_partial(&self) -> PartialMessage {
        PartialMessage {
            id: self.id,
            channel_id: self.channel_id,
        }
    }
}

/// A message known only by its id and channel.
///
/// Enough to edit, reply to or fetch the message without holding its
/// content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
}

impl PartialMessage {
    pub fn new(id: impl Into<Snowflake>, channel_id: impl Into<Snowflake>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
        }
    }
}

/// An invite to a guild channel. Invites are addressed by their code,
/// not by an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub code: String,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
    #[serde(default)]
    pub inviter: Option<User>,
    /// Approximate member count, present when requested with counts.
    #[serde(default)]
    pub member_count: Option<u32>,
    /// Expiry as a unix timestamp in seconds, present when requested.
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub scheduled_event_id: Option<Snowflake>,
}

impl Invite {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            guild_id: None,
            channel_id: None,
            inviter: None,
            member_count: None,
            expires_at: None,
            scheduled_event_id: None,
        }
    }
}

/// A custom emoji uploaded to a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    pub id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub name: String,
    #[serde(default)]
    pub animated: bool,
}

/// Either a unicode emoji (name only) or a reference to a custom emoji.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartialEmoji {
    #[serde(default)]
    pub id: Option<Snowflake>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

impl PartialEmoji {
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn custom(id: impl Into<Snowflake>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

impl From<&Emoji> for PartialEmoji {
    fn from(emoji: &Emoji) -> Self {
        Self {
            id: Some(emoji.id),
            name: Some(emoji.name.clone()),
            animated: emoji.animated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    pub id: Snowflake,
    pub name: String,
}

impl_entity! {
    User => "user",
    Guild => "guild",
    Channel => "channel",
    Role => "role",
    Message => "message",
    PartialMessage => "message",
    Emoji => "emoji",
    Sticker => "sticker",
}
