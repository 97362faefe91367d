use std::sync::Arc;

use async_trait::async_trait;
use linkme::distributed_slice;

use super::primitives::IntParser;
use super::registry::{BUILTIN_PARSERS, ParserRegistration, ParserRegistry};
use super::{BoxedParser, ErasedParser};
use crate::di::Dependencies;
use crate::error::{ParseError, ParseResult};
use crate::reflect::{AnyValue, DynValue, EnumAdapter, FieldType, TypeKey, markers};

/// Fieldless enums, written as their base-36 discriminant.
pub struct EnumParser {
    target: TypeKey,
    int: IntParser<i64>,
    adapter: EnumAdapter,
}

impl EnumParser {
    pub fn from_type(ty: &FieldType) -> ParseResult<Self> {
        Ok(Self {
            target: ty.key(),
            int: IntParser::new(),
            adapter: *ty.require_adapter::<EnumAdapter>()?,
        })
    }
}

#[async_trait]
impl ErasedParser for EnumParser {
    fn target(&self) -> TypeKey {
        self.target
    }

    async fn loads_any(&self, token: &str, _deps: &Dependencies) -> ParseResult<AnyValue> {
        let value = self.int.parse(token)?;
        (self.adapter.from_discriminant)(value).ok_or_else(|| {
            ParseError::malformed(token, self.target.name(), "unknown enum discriminant")
        })
    }

    async fn dumps_any(&self, value: &DynValue) -> ParseResult<String> {
        Ok(self.int.format((self.adapter.discriminant)(value)?))
    }
}

fn enum_factory(ty: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    Ok(Arc::new(EnumParser::from_type(ty)?))
}

#[distributed_slice(BUILTIN_PARSERS)]
static ENUM: ParserRegistration = ParserRegistration {
    name: "enum",
    types: &[TypeKey::of::<markers::AnyEnum>],
    priority: 0,
    factory: enum_factory,
};
