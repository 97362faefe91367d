//! Platform object model.

mod entity;
mod snowflake;

pub use entity::{
    Channel, ChannelKind, Emoji, Entity, Guild, Invite, Member, Message, PartialEmoji,
    PartialMessage, Role, Sticker, User,
};
pub use snowflake::{Object, Snowflake};
