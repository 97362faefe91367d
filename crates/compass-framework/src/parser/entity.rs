//! Parsers for platform objects referenced by id.
//!
//! Only the id is written into the custom id. Loading resolves it, in order:
//!
//! 1. an injected dependency of the same type with the same id (the author,
//!    the current guild, ...);
//! 2. the client's cache;
//! 3. a fetch through the client, unless the parser is cache-only.
//!
//! An object found nowhere is a [`LookupError::NotFound`].
//!
//! Partial messages are built from the id and the channel in scope without
//! any lookup. Invites are written as their code and always fetched.

use std::marker::PhantomData;

use async_trait::async_trait;
use compass_core::{
    BoxedClient, Channel, Client, Emoji, Entity, Guild, Interaction, Invite, InviteQuery, Member,
    Message, PartialMessage, PlatformError, Role, Snowflake, Sticker, User,
};
use linkme::distributed_slice;

use super::registry::{BUILTIN_PARSERS, ParserRegistration, ParserRegistry};
use super::snowflake::SnowflakeParser;
use super::{BoxedParser, Parser, ParserExt};
use crate::di::Dependencies;
use crate::error::{LookupError, ParseError, ParseResult};
use crate::reflect::{FieldType, TypeKey};

/// Converts a failed fetch into a parse error, keeping "not found" distinct.
fn fetch_error(err: PlatformError, kind: &'static str, id: Snowflake) -> ParseError {
    if err.is_not_found() {
        LookupError::not_found(kind, id).into()
    } else {
        ParseError::Platform(err)
    }
}

fn client(deps: &Dependencies) -> ParseResult<BoxedClient> {
    if let Some(client) = deps.get::<BoxedClient>() {
        return Ok(client.clone());
    }
    deps.get::<Interaction>()
        .map(|i| i.client.clone())
        .ok_or(LookupError::MissingDependency("client").into())
}

fn guild_id(deps: &Dependencies) -> ParseResult<Snowflake> {
    deps.get::<Guild>()
        .map(|g| g.id)
        .or_else(|| deps.get::<Interaction>()?.guild.as_ref().map(|g| g.id))
        .ok_or(LookupError::MissingDependency("guild").into())
}

fn channel_id(deps: &Dependencies) -> ParseResult<Snowflake> {
    deps.get::<Channel>()
        .map(|c| c.id)
        .or_else(|| deps.get::<Interaction>().map(|i| i.channel.id))
        .ok_or(LookupError::MissingDependency("channel").into())
}

/// Platform objects that can be resolved from an id.
#[async_trait]
pub trait Resolve: Entity + Clone + Send + Sync + Sized + 'static {
    fn get(client: &dyn Client, deps: &Dependencies, id: Snowflake) -> Option<Self>;

    async fn fetch(client: &dyn Client, deps: &Dependencies, id: Snowflake) -> ParseResult<Self>;
}

#[async_trait]
impl Resolve for User {
    fn get(client: &dyn Client, _deps: &Dependencies, id: Snowflake) -> Option<Self> {
        client.get_user(id)
    }

    async fn fetch(client: &dyn Client, _deps: &Dependencies, id: Snowflake) -> ParseResult<Self> {
        client
            .fetch_user(id)
            .await
            .map_err(|e| fetch_error(e, Self::KIND, id))
    }
}

#[async_trait]
impl Resolve for Guild {
    fn get(client: &dyn Client, _deps: &Dependencies, id: Snowflake) -> Option<Self> {
        client.get_guild(id)
    }

    async fn fetch(client: &dyn Client, _deps: &Dependencies, id: Snowflake) -> ParseResult<Self> {
        client
            .fetch_guild(id)
            .await
            .map_err(|e| fetch_error(e, Self::KIND, id))
    }
}

#[async_trait]
impl Resolve for Channel {
    fn get(client: &dyn Client, _deps: &Dependencies, id: Snowflake) -> Option<Self> {
        client.get_channel(id)
    }

    async fn fetch(client: &dyn Client, _deps: &Dependencies, id: Snowflake) -> ParseResult<Self> {
        client
            .fetch_channel(id)
            .await
            .map_err(|e| fetch_error(e, Self::KIND, id))
    }
}

#[async_trait]
impl Resolve for Member {
    fn get(client: &dyn Client, deps: &Dependencies, id: Snowflake) -> Option<Self> {
        client.get_member(guild_id(deps).ok()?, id)
    }

    async fn fetch(client: &dyn Client, deps: &Dependencies, id: Snowflake) -> ParseResult<Self> {
        client
            .fetch_member(guild_id(deps)?, id)
            .await
            .map_err(|e| fetch_error(e, Self::KIND, id))
    }
}

#[async_trait]
impl Resolve for Role {
    fn get(client: &dyn Client, deps: &Dependencies, id: Snowflake) -> Option<Self> {
        client.get_role(guild_id(deps).ok()?, id)
    }

    async fn fetch(client: &dyn Client, deps: &Dependencies, id: Snowflake) -> ParseResult<Self> {
        client
            .fetch_role(guild_id(deps)?, id)
            .await
            .map_err(|e| fetch_error(e, Self::KIND, id))
    }
}

#[async_trait]
impl Resolve for Message {
    fn get(client: &dyn Client, _deps: &Dependencies, id: Snowflake) -> Option<Self> {
        client.get_message(id)
    }

    async fn fetch(client: &dyn Client, deps: &Dependencies, id: Snowflake) -> ParseResult<Self> {
        client
            .fetch_message(channel_id(deps)?, id)
            .await
            .map_err(|e| fetch_error(e, Self::KIND, id))
    }
}

#[async_trait]
impl Resolve for Emoji {
    fn get(client: &dyn Client, _deps: &Dependencies, id: Snowflake) -> Option<Self> {
        client.get_emoji(id)
    }

    async fn fetch(client: &dyn Client, deps: &Dependencies, id: Snowflake) -> ParseResult<Self> {
        client
            .fetch_emoji(guild_id(deps)?, id)
            .await
            .map_err(|e| fetch_error(e, Self::KIND, id))
    }
}

#[async_trait]
impl Resolve for Sticker {
    fn get(client: &dyn Client, _deps: &Dependencies, id: Snowflake) -> Option<Self> {
        client.get_sticker(id)
    }

    async fn fetch(client: &dyn Client, _deps: &Dependencies, id: Snowflake) -> ParseResult<Self> {
        client
            .fetch_sticker(id)
            .await
            .map_err(|e| fetch_error(e, Self::KIND, id))
    }
}

/// Resolves a platform object from its id.
pub struct EntityParser<E> {
    ids: SnowflakeParser,
    allow_fetch: bool,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Resolve> EntityParser<E> {
    /// A parser that falls back to fetching on a cache miss.
    pub fn new() -> Self {
        Self {
            ids: SnowflakeParser::new(),
            allow_fetch: true,
            _marker: PhantomData,
        }
    }

    /// A parser that never makes network requests.
    pub fn cache_only() -> Self {
        Self::new().allow_fetch(false)
    }

    pub fn allow_fetch(mut self, allow: bool) -> Self {
        self.allow_fetch = allow;
        self
    }

    pub fn with_ids(mut self, ids: SnowflakeParser) -> Self {
        self.ids = ids;
        self
    }
}

impl<E: Resolve> Default for EntityParser<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Resolve> Parser for EntityParser<E> {
    type Target = E;

    async fn loads(&self, token: &str, deps: &Dependencies) -> ParseResult<E> {
        let id = self.ids.load_id(token)?;

        if let Some(injected) = deps.get::<E>().filter(|e| e.id() == id) {
            return Ok(injected.clone());
        }

        let client = client(deps)?;
        if let Some(cached) = E::get(client.as_ref(), deps, id) {
            return Ok(cached);
        }

        if self.allow_fetch {
            match E::fetch(client.as_ref(), deps, id).await {
                Ok(fetched) => return Ok(fetched),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }

        Err(LookupError::not_found(E::KIND, id).into())
    }

    async fn dumps(&self, value: &E) -> ParseResult<String> {
        Ok(self.ids.dump_id(value.id()))
    }
}

pub type UserParser = EntityParser<User>;
pub type MemberParser = EntityParser<Member>;
pub type GuildParser = EntityParser<Guild>;
pub type ChannelParser = EntityParser<Channel>;
pub type RoleParser = EntityParser<Role>;
pub type MessageParser = EntityParser<Message>;
pub type EmojiParser = EntityParser<Emoji>;
pub type StickerParser = EntityParser<Sticker>;

/// Builds a [`PartialMessage`] from its id, addressed to a fixed channel or
/// to the channel in scope. Never touches the client.
#[derive(Default)]
pub struct PartialMessageParser {
    ids: SnowflakeParser,
    channel: Option<Snowflake>,
}

impl PartialMessageParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always addresses messages in `channel`, ignoring the one in scope.
    pub fn in_channel(mut self, channel: impl Into<Snowflake>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_ids(mut self, ids: SnowflakeParser) -> Self {
        self.ids = ids;
        self
    }
}

#[async_trait]
impl Parser for PartialMessageParser {
    type Target = PartialMessage;

    async fn loads(&self, token: &str, deps: &Dependencies) -> ParseResult<PartialMessage> {
        let id = self.ids.load_id(token)?;
        let channel_id = match self.channel {
            Some(channel) => channel,
            None => channel_id(deps)?,
        };
        Ok(PartialMessage { id, channel_id })
    }

    async fn dumps(&self, value: &PartialMessage) -> ParseResult<String> {
        Ok(self.ids.dump_id(value.id))
    }
}

/// Fetches an [`Invite`] by its code.
#[derive(Default)]
pub struct InviteParser {
    query: InviteQuery,
}

impl InviteParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: InviteQuery) -> Self {
        self.query = query;
        self
    }
}

#[async_trait]
impl Parser for InviteParser {
    type Target = Invite;

    async fn loads(&self, token: &str, deps: &Dependencies) -> ParseResult<Invite> {
        if token.is_empty() {
            return Err(ParseError::malformed(token, "Invite", "empty invite code"));
        }
        let client = client(deps)?;
        client
            .fetch_invite(token, self.query)
            .await
            .map_err(ParseError::Platform)
    }

    async fn dumps(&self, value: &Invite) -> ParseResult<String> {
        Ok(value.code.clone())
    }
}

fn partial_message_factory(_: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    Ok(PartialMessageParser::new().boxed())
}

fn invite_factory(_: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    Ok(InviteParser::new().boxed())
}

#[distributed_slice(BUILTIN_PARSERS)]
static PARTIAL_MESSAGE: ParserRegistration = ParserRegistration {
    name: "partial_message",
    types: &[TypeKey::of::<PartialMessage>],
    priority: 0,
    factory: partial_message_factory,
};

#[distributed_slice(BUILTIN_PARSERS)]
static INVITE: ParserRegistration = ParserRegistration {
    name: "invite",
    types: &[TypeKey::of::<Invite>],
    priority: 0,
    factory: invite_factory,
};

fn entity_factory<E: Resolve>(_: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    Ok(EntityParser::<E>::new().boxed())
}

macro_rules! register_entities {
    ($($name:ident: $ty:ty => $label:literal),* $(,)?) => {
        $(
            #[distributed_slice(BUILTIN_PARSERS)]
            static $name: ParserRegistration = ParserRegistration {
                name: $label,
                types: &[TypeKey::of::<$ty>],
                priority: 0,
                factory: entity_factory::<$ty>,
            };
        )*
    };
}

register_entities! {
    USER: User => "user",
    MEMBER: Member => "member",
    GUILD: Guild => "guild",
    CHANNEL: Channel => "channel",
    ROLE: Role => "role",
    MESSAGE: Message => "message",
    EMOJI: Emoji => "emoji",
    STICKER: Sticker => "sticker",
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_core::{ChannelKind, Listeners, PlatformResult};
    use std::any::Any;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockClient {
        listeners: Listeners,
        cached: Vec<User>,
        remote: Vec<User>,
        invites: Vec<Invite>,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl Client for MockClient {
        fn listeners(&self) -> &Listeners {
            &self.listeners
        }

        fn get_user(&self, id: Snowflake) -> Option<User> {
            self.cached.iter().find(|u| u.id == id).cloned()
        }

        async fn fetch_user(&self, id: Snowflake) -> PlatformResult<User> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.remote
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or(PlatformError::not_found("user", id))
        }

        async fn fetch_guild(&self, _id: Snowflake) -> PlatformResult<Guild> {
            Err(PlatformError::request("rate limited"))
        }

        async fn fetch_invite(&self, code: &str, query: InviteQuery) -> PlatformResult<Invite> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut invite = self
                .invites
                .iter()
                .find(|i| i.code == code)
                .cloned()
                .ok_or(PlatformError::request("unknown invite"))?;
            if !query.with_counts {
                invite.member_count = None;
            }
            Ok(invite)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn user(id: u64, name: &str) -> User {
        User {
            id: Snowflake(id),
            name: name.into(),
            bot: false,
        }
    }

    fn setup() -> (Arc<MockClient>, Dependencies) {
        let client = Arc::new(MockClient {
            listeners: Listeners::new(),
            cached: vec![user(1, "cached")],
            remote: vec![user(2, "remote")],
            invites: vec![Invite {
                member_count: Some(12),
                ..Invite::new("aBc9")
            }],
            fetches: AtomicUsize::new(0),
        });
        let boxed: BoxedClient = client.clone();
        (client, Dependencies::new().with(boxed))
    }

    #[tokio::test]
    async fn test_injected_dependency_wins() {
        let (client, deps) = setup();
        let deps = deps.with(user(1, "injected"));

        let loaded = UserParser::new().loads("1", &deps).await.unwrap();
        assert_eq!(loaded.name, "injected");
        assert_eq!(client.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_before_fetch() {
        let (client, deps) = setup();
        let loaded = UserParser::new().loads("1", &deps).await.unwrap();
        assert_eq!(loaded.name, "cached");
        assert_eq!(client.fetches.load(Ordering::SeqCst), 0);

        let loaded = UserParser::new().loads("2", &deps).await.unwrap();
        assert_eq!(loaded.name, "remote");
        assert_eq!(client.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_only_reports_not_found() {
        let (client, deps) = setup();
        let err = UserParser::cache_only().loads("2", &deps).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(client.fetches.load(Ordering::SeqCst), 0);

        let err = UserParser::new().loads("3", &deps).await.unwrap_err();
        assert!(matches!(
            err,
            ParseError::Lookup(LookupError::NotFound { kind: "user", .. })
        ));
    }

    #[tokio::test]
    async fn test_other_platform_errors_propagate() {
        let (_, deps) = setup();
        let err = GuildParser::new().loads("5", &deps).await.unwrap_err();
        assert!(matches!(err, ParseError::Platform(PlatformError::Request(_))));
    }

    #[tokio::test]
    async fn test_missing_context() {
        let err = UserParser::new()
            .loads("1", &Dependencies::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::Lookup(LookupError::MissingDependency("client"))));

        let (_, deps) = setup();
        let err = MemberParser::new().loads("1", &deps).await.unwrap_err();
        assert!(matches!(err, ParseError::Lookup(LookupError::MissingDependency("guild"))));
    }

    #[tokio::test]
    async fn test_dumps_only_id() {
        let channel = Channel {
            id: Snowflake(71),
            guild_id: None,
            name: "general".into(),
            kind: ChannelKind::Text,
        };
        assert_eq!(ChannelParser::new().dumps(&channel).await.unwrap(), "1z");
    }

    fn channel(id: u64) -> Channel {
        Channel {
            id: Snowflake(id),
            guild_id: None,
            name: "general".into(),
            kind: ChannelKind::Text,
        }
    }

    #[tokio::test]
    async fn test_partial_message_uses_channel_in_scope() {
        let (client, deps) = setup();
        let deps = deps.with(channel(71));

        let message = PartialMessageParser::new().loads("a", &deps).await.unwrap();
        assert_eq!(message, PartialMessage::new(10u64, 71u64));
        assert_eq!(client.fetches.load(Ordering::SeqCst), 0);

        let message = PartialMessageParser::new()
            .in_channel(5u64)
            .loads("a", &deps)
            .await
            .unwrap();
        assert_eq!(message.channel_id, Snowflake(5));
        assert_eq!(PartialMessageParser::new().dumps(&message).await.unwrap(), "a");
    }

    #[tokio::test]
    async fn test_partial_message_needs_a_channel() {
        let err = PartialMessageParser::new()
            .loads("a", &Dependencies::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::Lookup(LookupError::MissingDependency("channel"))));
    }

    #[tokio::test]
    async fn test_invite_is_fetched_by_code() {
        let (client, deps) = setup();
        let invite = InviteParser::new().loads("aBc9", &deps).await.unwrap();
        assert_eq!(invite.member_count, Some(12));
        assert_eq!(InviteParser::new().dumps(&invite).await.unwrap(), "aBc9");

        let query = InviteQuery {
            with_counts: false,
            ..InviteQuery::default()
        };
        let invite = InviteParser::new().with_query(query).loads("aBc9", &deps).await.unwrap();
        assert_eq!(invite.member_count, None);
        assert_eq!(client.fetches.load(Ordering::SeqCst), 2);

        let err = InviteParser::new().loads("gone", &deps).await.unwrap_err();
        assert!(matches!(err, ParseError::Platform(PlatformError::Request(_))));
        assert!(matches!(
            InviteParser::new().loads("", &deps).await,
            Err(ParseError::Malformed { .. })
        ));
    }

    #[test]
    fn test_partial_and_invite_parsers_are_registered() {
        use crate::parser::get_parser;

        assert!(get_parser(&FieldType::of::<PartialMessage>()).is_ok());
        assert!(get_parser(&FieldType::of::<Invite>()).is_ok());
    }
}
