//! Parsers for `Option<T>`, `Vec<T>` and `Either<L, R>`.
//!
//! These wrap the parsers of their type arguments and work on type-erased
//! values through the adapters attached to the [`FieldType`].

use async_trait::async_trait;
use linkme::distributed_slice;
use std::sync::Arc;

use super::registry::{BUILTIN_PARSERS, ParserRegistration, ParserRegistry};
use super::{BoxedParser, ErasedParser};
use crate::di::Dependencies;
use crate::error::{ParseError, ParseResult};
use crate::reflect::{
    AnyValue, DynValue, Either, EitherAdapter, FieldType, OptionAdapter, TypeKey, VecAdapter,
    markers,
};

// =============================================================================
// Option
// =============================================================================

/// `None` is the empty token; anything else goes to the inner parser.
///
/// A `Some` whose inner token would be empty is rejected when dumping,
/// since it would load back as `None`.
pub struct OptionParser {
    target: TypeKey,
    inner: BoxedParser,
    adapter: OptionAdapter,
}

impl OptionParser {
    pub fn from_type(ty: &FieldType, inner: BoxedParser) -> ParseResult<Self> {
        let adapter = ty.require_adapter::<OptionAdapter>()?;
        Ok(Self {
            target: ty.key(),
            inner,
            adapter: *adapter,
        })
    }
}

#[async_trait]
impl ErasedParser for OptionParser {
    fn target(&self) -> TypeKey {
        self.target
    }

    async fn loads_any(&self, token: &str, deps: &Dependencies) -> ParseResult<AnyValue> {
        if token.is_empty() {
            return Ok((self.adapter.none)());
        }
        let value = self.inner.loads_any(token, deps).await?;
        (self.adapter.some)(value)
    }

    async fn dumps_any(&self, value: &DynValue) -> ParseResult<String> {
        match (self.adapter.get)(value)? {
            Some(inner) => {
                let token = self.inner.dumps_any(inner).await?;
                if token.is_empty() {
                    return Err(ParseError::malformed(
                        &token,
                        self.target.name(),
                        "`Some` value dumps to the empty token reserved for `None`",
                    ));
                }
                Ok(token)
            }
            None => Ok(String::new()),
        }
    }
}

fn option_factory(ty: &FieldType, registry: &ParserRegistry) -> ParseResult<BoxedParser> {
    let inner = registry.get_parser(ty.arg(0)?)?;
    Ok(Arc::new(OptionParser::from_type(ty, inner)?))
}

#[distributed_slice(BUILTIN_PARSERS)]
static OPTION: ParserRegistration = ParserRegistration {
    name: "option",
    types: &[TypeKey::of::<markers::OptionOf>],
    priority: 0,
    factory: option_factory,
};

// =============================================================================
// Vec
// =============================================================================

/// Items joined by a separator (`,` by default).
///
/// Items that dump to a token containing the separator are rejected rather
/// than escaped.
pub struct VecParser {
    target: TypeKey,
    inner: BoxedParser,
    adapter: VecAdapter,
    sep: char,
}

impl VecParser {
    pub const DEFAULT_SEP: char = ',';

    pub fn from_type(ty: &FieldType, inner: BoxedParser) -> ParseResult<Self> {
        let adapter = ty.require_adapter::<VecAdapter>()?;
        Ok(Self {
            target: ty.key(),
            inner,
            adapter: *adapter,
            sep: Self::DEFAULT_SEP,
        })
    }

    pub fn with_sep(mut self, sep: char) -> Self {
        self.sep = sep;
        self
    }
}

#[async_trait]
impl ErasedParser for VecParser {
    fn target(&self) -> TypeKey {
        self.target
    }

    async fn loads_any(&self, token: &str, deps: &Dependencies) -> ParseResult<AnyValue> {
        let mut items = Vec::new();
        if !token.is_empty() {
            for part in token.split(self.sep) {
                items.push(self.inner.loads_any(part, deps).await?);
            }
        }
        (self.adapter.collect)(items)
    }

    async fn dumps_any(&self, value: &DynValue) -> ParseResult<String> {
        let mut parts = Vec::new();
        for (index, item) in (self.adapter.items)(value)?.into_iter().enumerate() {
            let part = self.inner.dumps_any(item).await?;
            if part.contains(self.sep) {
                return Err(ParseError::ContainsSeparator {
                    field: format!("[{index}]"),
                    token: part,
                    sep: self.sep.to_string(),
                });
            }
            parts.push(part);
        }
        Ok(parts.join(&self.sep.to_string()))
    }
}

fn vec_factory(ty: &FieldType, registry: &ParserRegistry) -> ParseResult<BoxedParser> {
    let inner = registry.get_parser(ty.arg(0)?)?;
    Ok(Arc::new(VecParser::from_type(ty, inner)?))
}

#[distributed_slice(BUILTIN_PARSERS)]
static VEC: ParserRegistration = ParserRegistration {
    name: "vec",
    types: &[TypeKey::of::<markers::VecOf>],
    priority: 0,
    factory: vec_factory,
};

// =============================================================================
// Either
// =============================================================================

const LEFT_TAG: char = '0';
const RIGHT_TAG: char = '1';

/// Prefixes the inner token with a side tag: `0` for left, `1` for right.
pub struct EitherParser {
    target: TypeKey,
    left: BoxedParser,
    right: BoxedParser,
    adapter: EitherAdapter,
}

impl EitherParser {
    pub fn from_type(ty: &FieldType, left: BoxedParser, right: BoxedParser) -> ParseResult<Self> {
        let adapter = ty.require_adapter::<EitherAdapter>()?;
        Ok(Self {
            target: ty.key(),
            left,
            right,
            adapter: *adapter,
        })
    }
}

#[async_trait]
impl ErasedParser for EitherParser {
    fn target(&self) -> TypeKey {
        self.target
    }

    async fn loads_any(&self, token: &str, deps: &Dependencies) -> ParseResult<AnyValue> {
        let mut chars = token.chars();
        match chars.next() {
            Some(LEFT_TAG) => (self.adapter.left)(self.left.loads_any(chars.as_str(), deps).await?),
            Some(RIGHT_TAG) => {
                (self.adapter.right)(self.right.loads_any(chars.as_str(), deps).await?)
            }
            _ => Err(ParseError::malformed(
                token,
                self.target.name(),
                format!("expected side tag '{LEFT_TAG}' or '{RIGHT_TAG}'"),
            )),
        }
    }

    async fn dumps_any(&self, value: &DynValue) -> ParseResult<String> {
        Ok(match (self.adapter.split)(value)? {
            Either::Left(left) => format!("{LEFT_TAG}{}", self.left.dumps_any(left).await?),
            Either::Right(right) => format!("{RIGHT_TAG}{}", self.right.dumps_any(right).await?),
        })
    }
}

fn either_factory(ty: &FieldType, registry: &ParserRegistry) -> ParseResult<BoxedParser> {
    let left = registry.get_parser(ty.arg(0)?)?;
    let right = registry.get_parser(ty.arg(1)?)?;
    Ok(Arc::new(EitherParser::from_type(ty, left, right)?))
}

#[distributed_slice(BUILTIN_PARSERS)]
static EITHER: ParserRegistration = ParserRegistration {
    name: "either",
    types: &[TypeKey::of::<markers::EitherOf>],
    priority: 0,
    factory: either_factory,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::get_parser;
    use crate::reflect::Reflect;

    async fn round_trip<T: Reflect + Clone + PartialEq + std::fmt::Debug>(value: T) -> String {
        let parser = get_parser(&T::field_type()).unwrap();
        let token = parser.dumps_any(&value).await.unwrap();
        let loaded = parser.loads_any(&token, &Dependencies::new()).await.unwrap();
        assert_eq!(loaded.downcast_ref::<T>(), Some(&value));
        token
    }

    #[tokio::test]
    async fn test_option_uses_empty_token_for_none() {
        assert_eq!(round_trip(None::<i64>).await, "");
        assert_eq!(round_trip(Some(71i64)).await, "1z");
    }

    #[tokio::test]
    async fn test_vec_joins_with_comma() {
        assert_eq!(round_trip(vec![1u8, 2, 36]).await, "1,2,10");
        assert_eq!(round_trip(Vec::<u8>::new()).await, "");
    }

    #[tokio::test]
    async fn test_vec_rejects_items_containing_separator() {
        let parser = get_parser(&<Vec<String>>::field_type()).unwrap();
        let err = parser
            .dumps_any(&vec!["a".to_string(), "b,c".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::ContainsSeparator { field, .. } if field == "[1]"));
    }

    #[tokio::test]
    async fn test_option_rejects_some_that_dumps_empty() {
        assert_eq!(round_trip(Some("x".to_string())).await, "x");

        let parser = get_parser(&<Option<String>>::field_type()).unwrap();
        let err = parser.dumps_any(&Some(String::new())).await.unwrap_err();
        assert!(matches!(err, ParseError::Malformed { ref token, .. } if token.is_empty()));
    }

    #[tokio::test]
    async fn test_either_tags_each_side() {
        type IntOrText = Either<u32, String>;
        assert_eq!(round_trip(IntOrText::Left(10)).await, "0a");
        assert_eq!(round_trip(IntOrText::Right("hello!".into())).await, "1hello!");

        // Valid as a base-36 integer, still loads as text.
        assert_eq!(round_trip(IntOrText::Right("5".into())).await, "15");
        assert_eq!(round_trip(IntOrText::Right(String::new())).await, "1");
    }

    #[tokio::test]
    async fn test_either_requires_side_tag() {
        let parser = get_parser(&<Either<u32, String>>::field_type()).unwrap();
        for token in ["b", "2b", ""] {
            let err = parser.loads_any(token, &Dependencies::new()).await.unwrap_err();
            assert!(matches!(err, ParseError::Malformed { .. }), "{token:?}: {err}");
        }
    }

    #[tokio::test]
    async fn test_wrong_value_type_is_type_mismatch() {
        let parser = get_parser(&<Option<u8>>::field_type()).unwrap();
        let err = parser.dumps_any(&"not an option").await.unwrap_err();
        assert!(matches!(err, ParseError::TypeMismatch { .. }));
    }
}
