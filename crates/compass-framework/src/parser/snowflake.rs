//! Id-only parsers: raw snowflakes, id-backed types and partial emoji.

use std::sync::Arc;

use async_trait::async_trait;
use compass_core::{PartialEmoji, Snowflake};
use linkme::distributed_slice;

use super::primitives::IntParser;
use super::registry::{BUILTIN_PARSERS, ParserRegistration, ParserRegistry};
use super::{BoxedParser, ErasedParser, Parser, ParserExt};
use crate::di::Dependencies;
use crate::error::{ParseError, ParseResult};
use crate::reflect::{AnyValue, DynValue, FieldType, SnowflakeAdapter, TypeKey, markers};

/// Snowflakes as base-36 integers.
#[derive(Clone, Default)]
pub struct SnowflakeParser {
    int: IntParser<u64>,
}

impl SnowflakeParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_int_parser(int: IntParser<u64>) -> Self {
        Self { int }
    }

    pub(crate) fn load_id(&self, token: &str) -> ParseResult<Snowflake> {
        self.int.parse(token).map(Snowflake)
    }

    pub(crate) fn dump_id(&self, id: Snowflake) -> String {
        self.int.format(id.get())
    }
}

#[async_trait]
impl Parser for SnowflakeParser {
    type Target = Snowflake;

    async fn loads(&self, token: &str, _deps: &Dependencies) -> ParseResult<Snowflake> {
        self.load_id(token)
    }

    async fn dumps(&self, value: &Snowflake) -> ParseResult<String> {
        Ok(self.dump_id(*value))
    }
}

/// Any [`FromSnowflake`](crate::reflect::FromSnowflake) type, through its adapter.
struct IdBackedParser {
    target: TypeKey,
    ids: SnowflakeParser,
    adapter: SnowflakeAdapter,
}

#[async_trait]
impl ErasedParser for IdBackedParser {
    fn target(&self) -> TypeKey {
        self.target
    }

    async fn loads_any(&self, token: &str, _deps: &Dependencies) -> ParseResult<AnyValue> {
        Ok((self.adapter.from_id)(self.ids.load_id(token)?))
    }

    async fn dumps_any(&self, value: &DynValue) -> ParseResult<String> {
        Ok(self.ids.dump_id((self.adapter.id)(value)?))
    }
}

fn snowflake_factory(ty: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    if ty.is::<Snowflake>() {
        return Ok(SnowflakeParser::new().boxed());
    }
    let adapter = ty.require_adapter::<SnowflakeAdapter>()?;
    Ok(Arc::new(IdBackedParser {
        target: ty.key(),
        ids: SnowflakeParser::new(),
        adapter: *adapter,
    }))
}

#[distributed_slice(BUILTIN_PARSERS)]
static SNOWFLAKE: ParserRegistration = ParserRegistration {
    name: "snowflake",
    types: &[TypeKey::of::<Snowflake>, TypeKey::of::<markers::AnySnowflake>],
    priority: 0,
    factory: snowflake_factory,
};

/// Custom emoji by id. Unicode emoji have no id and cannot be dumped.
#[derive(Clone, Default)]
pub struct PartialEmojiParser {
    ids: SnowflakeParser,
}

#[async_trait]
impl Parser for PartialEmojiParser {
    type Target = PartialEmoji;

    async fn loads(&self, token: &str, _deps: &Dependencies) -> ParseResult<PartialEmoji> {
        Ok(PartialEmoji::custom(self.ids.load_id(token)?))
    }

    async fn dumps(&self, value: &PartialEmoji) -> ParseResult<String> {
        let id = value.id.ok_or_else(|| {
            ParseError::malformed(
                value.name.as_deref().unwrap_or_default(),
                "PartialEmoji",
                "partial emoji must have an id to be dumped",
            )
        })?;
        Ok(self.ids.dump_id(id))
    }
}

fn partial_emoji_factory(_: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    Ok(PartialEmojiParser::default().boxed())
}

#[distributed_slice(BUILTIN_PARSERS)]
static PARTIAL_EMOJI: ParserRegistration = ParserRegistration {
    name: "partial_emoji",
    types: &[TypeKey::of::<PartialEmoji>],
    priority: 0,
    factory: partial_emoji_factory,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::get_parser;
    use crate::reflect::{FromSnowflake, Reflect};
    use compass_core::Object;

    #[derive(Debug, PartialEq)]
    struct ThreadRef(Snowflake);

    impl FromSnowflake for ThreadRef {
        fn from_snowflake(id: Snowflake) -> Self {
            Self(id)
        }

        fn snowflake(&self) -> Snowflake {
            self.0
        }
    }

    impl Reflect for ThreadRef {
        fn field_type() -> FieldType {
            FieldType::snowflake_like::<Self>()
        }
    }

    #[tokio::test]
    async fn test_snowflake_base_36() {
        let parser = SnowflakeParser::new();
        let id = Snowflake(1_234_567_890_123_456_789);
        let token = parser.dumps(&id).await.unwrap();
        assert_eq!(token, "9do1sj396nf9");
        assert_eq!(parser.loads(&token, &Dependencies::new()).await.unwrap(), id);
    }

    #[tokio::test]
    async fn test_user_types_resolve_through_snowflake_base() {
        for ty in [ThreadRef::field_type(), Object::field_type()] {
            assert!(get_parser(&ty).is_ok());
        }

        let parser = get_parser(&ThreadRef::field_type()).unwrap();
        let token = parser.dumps_any(&ThreadRef(Snowflake(36))).await.unwrap();
        assert_eq!(token, "10");
        let value = parser.loads_any("10", &Dependencies::new()).await.unwrap();
        assert_eq!(value.downcast_ref::<ThreadRef>(), Some(&ThreadRef(Snowflake(36))));
    }

    #[tokio::test]
    async fn test_partial_emoji_requires_id() {
        let parser = PartialEmojiParser::default();
        assert_eq!(parser.dumps(&PartialEmoji::custom(35u64)).await.unwrap(), "z");

        let err = parser.dumps(&PartialEmoji::unicode("🦀")).await.unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));

        let loaded = parser.loads("z", &Dependencies::new()).await.unwrap();
        assert_eq!(loaded.id, Some(Snowflake(35)));
    }
}
