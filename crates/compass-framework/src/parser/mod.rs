//! Bidirectional string codecs for custom-id fields.
//!
//! A [`Parser`] converts one type to and from a token. Factories store
//! parsers type-erased as [`BoxedParser`] so fields of different types can
//! sit in one ordered list.
//!
//! # Example
//!
//! ```rust,ignore
//! use compass_framework::parser::{Parser, ParserExt};
//!
//! struct Hex;
//!
//! #[async_trait]
//! impl Parser for Hex {
//!     type Target = u32;
//!
//!     async fn loads(&self, token: &str, _: &Dependencies) -> ParseResult<u32> {
//!         u32::from_str_radix(token, 16)
//!             .map_err(|e| ParseError::malformed(token, "u32", e.to_string()))
//!     }
//!
//!     async fn dumps(&self, value: &u32) -> ParseResult<String> {
//!         Ok(format!("{value:x}"))
//!     }
//! }
//!
//! let parser = Hex.boxed();
//! ```

mod collections;
mod entity;
mod enumeration;
mod primitives;
pub mod registry;
mod snowflake;

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::di::Dependencies;
use crate::error::ParseResult;
use crate::reflect::{AnyValue, DynValue, TypeKey, downcast_ref};

pub use collections::{EitherParser, OptionParser, VecParser};
pub use entity::{
    ChannelParser, EmojiParser, EntityParser, GuildParser, InviteParser, MemberParser,
    MessageParser, PartialMessageParser, Resolve, RoleParser, StickerParser, UserParser,
};
pub use enumeration::EnumParser;
pub use primitives::{BoolParser, CharParser, FloatParser, IntParser, StringParser};
pub use registry::{
    BUILTIN_PARSERS, ParserFactoryFn, ParserRegistration, ParserRegistry, get_parser,
    register_parser, with_registry,
};
pub use snowflake::{PartialEmojiParser, SnowflakeParser};

/// A typed codec for one semantic type.
///
/// `loads(dumps(v))` must give back `v`; reference parsers relax this to
/// "an object with the same id".
#[async_trait]
pub trait Parser: Send + Sync + 'static {
    type Target: Send + Sync + 'static;

    async fn loads(&self, token: &str, deps: &Dependencies) -> ParseResult<Self::Target>;

    async fn dumps(&self, value: &Self::Target) -> ParseResult<String>;
}

/// Object-safe form of [`Parser`] over type-erased values.
#[async_trait]
pub trait ErasedParser: Send + Sync {
    /// The type this parser produces and accepts.
    fn target(&self) -> TypeKey;

    async fn loads_any(&self, token: &str, deps: &Dependencies) -> ParseResult<AnyValue>;

    async fn dumps_any(&self, value: &DynValue) -> ParseResult<String>;
}

/// Shared, type-erased parser.
pub type BoxedParser = Arc<dyn ErasedParser>;

/// Adapts a typed [`Parser`] to [`ErasedParser`].
pub struct Typed<P>(pub P);

#[async_trait]
impl<P: Parser> ErasedParser for Typed<P> {
    fn target(&self) -> TypeKey {
        TypeKey::of::<P::Target>()
    }

    async fn loads_any(&self, token: &str, deps: &Dependencies) -> ParseResult<AnyValue> {
        let value = self.0.loads(token, deps).await?;
        Ok(Box::new(value))
    }

    async fn dumps_any(&self, value: &DynValue) -> ParseResult<String> {
        self.0.dumps(downcast_ref::<P::Target>(value)?).await
    }
}

impl<P> fmt::Debug for Typed<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Typed").field(&type_name::<P>()).finish()
    }
}

/// Extension methods for typed parsers.
pub trait ParserExt: Parser + Sized {
    /// Erases the parser for storage in a factory or field declaration.
    fn boxed(self) -> BoxedParser {
        Arc::new(Typed(self))
    }
}

impl<P: Parser> ParserExt for P {}
