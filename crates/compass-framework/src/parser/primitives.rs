//! Parsers for integers, floats, booleans, characters and strings.

use std::any::type_name;
use std::marker::PhantomData;

use async_trait::async_trait;
use linkme::distributed_slice;

use super::registry::{BUILTIN_PARSERS, ParserRegistration, ParserRegistry};
use super::{BoxedParser, Parser, ParserExt};
use crate::di::Dependencies;
use crate::error::{ParseError, ParseResult};
use crate::reflect::{FieldType, TypeKey};

// =============================================================================
// Integers
// =============================================================================

/// Integers that can be written in an arbitrary radix.
pub trait RadixInt: Copy + Send + Sync + 'static {
    fn to_radix(self, radix: u32) -> String;

    fn from_radix(token: &str, radix: u32) -> Result<Self, std::num::ParseIntError>;
}

fn format_radix(mut magnitude: u128, negative: bool, radix: u32) -> String {
    if magnitude == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % radix as u128) as u32;
        digits.push(char::from_digit(digit, radix).unwrap_or('?'));
        magnitude /= radix as u128;
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

macro_rules! impl_radix_int {
    (signed: $($ty:ty),*; unsigned: $($uty:ty),*) => {
        $(
            impl RadixInt for $ty {
                fn to_radix(self, radix: u32) -> String {
                    format_radix(self.unsigned_abs() as u128, self < 0, radix)
                }

                fn from_radix(token: &str, radix: u32) -> Result<Self, std::num::ParseIntError> {
                    <$ty>::from_str_radix(token, radix)
                }
            }
        )*
        $(
            impl RadixInt for $uty {
                fn to_radix(self, radix: u32) -> String {
                    format_radix(self as u128, false, radix)
                }

                fn from_radix(token: &str, radix: u32) -> Result<Self, std::num::ParseIntError> {
                    <$uty>::from_str_radix(token, radix)
                }
            }
        )*
    };
}

impl_radix_int!(signed: i8, i16, i32, i64, i128, isize; unsigned: u8, u16, u32, u64, u128, usize);

/// Integer parser, base 36 unless configured otherwise.
///
/// Base 36 keeps ids short: a 64-bit snowflake takes at most 13 characters
/// instead of 20.
pub struct IntParser<T> {
    radix: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T: RadixInt> IntParser<T> {
    pub const DEFAULT_RADIX: u32 = 36;

    pub fn new() -> Self {
        Self {
            radix: Self::DEFAULT_RADIX,
            _marker: PhantomData,
        }
    }

    /// Uses another radix. Returns `None` outside `2..=36`.
    pub fn with_radix(radix: u32) -> Option<Self> {
        (2..=36).contains(&radix).then_some(Self {
            radix,
            _marker: PhantomData,
        })
    }

    pub fn radix(&self) -> u32 {
        self.radix
    }

    pub(crate) fn parse(&self, token: &str) -> ParseResult<T> {
        T::from_radix(token, self.radix)
            .map_err(|e| ParseError::malformed(token, type_name::<T>(), e.to_string()))
    }

    pub(crate) fn format(&self, value: T) -> String {
        value.to_radix(self.radix)
    }
}

impl<T: RadixInt> Default for IntParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for IntParser<T> {
    fn clone(&self) -> Self {
        Self {
            radix: self.radix,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: RadixInt> Parser for IntParser<T> {
    type Target = T;

    async fn loads(&self, token: &str, _deps: &Dependencies) -> ParseResult<T> {
        self.parse(token)
    }

    async fn dumps(&self, value: &T) -> ParseResult<String> {
        Ok(self.format(*value))
    }
}

fn int_factory(ty: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    macro_rules! pick {
        ($($t:ty),*) => {
            $(
                if ty.is::<$t>() {
                    return Ok(IntParser::<$t>::new().boxed());
                }
            )*
        };
    }
    pick!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
    Err(ParseError::NoParser(ty.name()))
}

#[distributed_slice(BUILTIN_PARSERS)]
static INT: ParserRegistration = ParserRegistration {
    name: "int",
    types: &[
        TypeKey::of::<i8>,
        TypeKey::of::<i16>,
        TypeKey::of::<i32>,
        TypeKey::of::<i64>,
        TypeKey::of::<i128>,
        TypeKey::of::<isize>,
        TypeKey::of::<u8>,
        TypeKey::of::<u16>,
        TypeKey::of::<u32>,
        TypeKey::of::<u64>,
        TypeKey::of::<u128>,
        TypeKey::of::<usize>,
    ],
    priority: 0,
    factory: int_factory,
};

// =============================================================================
// Floats
// =============================================================================

/// Floats written in their shortest round-trip form.
pub struct FloatParser<T>(PhantomData<fn() -> T>);

impl<T> FloatParser<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FloatParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! impl_float_parser {
    ($($ty:ty),*) => {
        $(
            #[async_trait]
            impl Parser for FloatParser<$ty> {
                type Target = $ty;

                async fn loads(&self, token: &str, _deps: &Dependencies) -> ParseResult<$ty> {
                    token
                        .parse::<$ty>()
                        .map_err(|e| ParseError::malformed(token, stringify!($ty), e.to_string()))
                }

                async fn dumps(&self, value: &$ty) -> ParseResult<String> {
                    let repr = format!("{value:?}");
                    Ok(match repr.strip_suffix(".0") {
                        Some(integral) => integral.to_string(),
                        None => repr,
                    })
                }
            }
        )*
    };
}

impl_float_parser!(f32, f64);

fn float_factory(ty: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    if ty.is::<f32>() {
        Ok(FloatParser::<f32>::new().boxed())
    } else if ty.is::<f64>() {
        Ok(FloatParser::<f64>::new().boxed())
    } else {
        Err(ParseError::NoParser(ty.name()))
    }
}

#[distributed_slice(BUILTIN_PARSERS)]
static FLOAT: ParserRegistration = ParserRegistration {
    name: "float",
    types: &[TypeKey::of::<f32>, TypeKey::of::<f64>],
    priority: 0,
    factory: float_factory,
};

// =============================================================================
// Booleans
// =============================================================================

/// Booleans as `1`/`0`; loads also accept common spellings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolParser;

const TRUE_VALUES: &[&str] = &["true", "t", "yes", "y", "1"];
const FALSE_VALUES: &[&str] = &["false", "f", "no", "n", "0"];

#[async_trait]
impl Parser for BoolParser {
    type Target = bool;

    async fn loads(&self, token: &str, _deps: &Dependencies) -> ParseResult<bool> {
        let lowered = token.to_ascii_lowercase();
        if TRUE_VALUES.contains(&lowered.as_str()) {
            Ok(true)
        } else if FALSE_VALUES.contains(&lowered.as_str()) {
            Ok(false)
        } else {
            Err(ParseError::malformed(token, "bool", "expected a boolean"))
        }
    }

    async fn dumps(&self, value: &bool) -> ParseResult<String> {
        Ok(if *value { "1" } else { "0" }.to_string())
    }
}

// =============================================================================
// Text
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct StringParser;

#[async_trait]
impl Parser for StringParser {
    type Target = String;

    async fn loads(&self, token: &str, _deps: &Dependencies) -> ParseResult<String> {
        Ok(token.to_string())
    }

    async fn dumps(&self, value: &String) -> ParseResult<String> {
        Ok(value.clone())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CharParser;

#[async_trait]
impl Parser for CharParser {
    type Target = char;

    async fn loads(&self, token: &str, _deps: &Dependencies) -> ParseResult<char> {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ParseError::malformed(token, "char", "expected exactly one character")),
        }
    }

    async fn dumps(&self, value: &char) -> ParseResult<String> {
        Ok(value.to_string())
    }
}

fn bool_factory(_: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    Ok(BoolParser.boxed())
}

fn string_factory(_: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    Ok(StringParser.boxed())
}

fn char_factory(_: &FieldType, _: &ParserRegistry) -> ParseResult<BoxedParser> {
    Ok(CharParser.boxed())
}

#[distributed_slice(BUILTIN_PARSERS)]
static BOOL: ParserRegistration = ParserRegistration {
    name: "bool",
    types: &[TypeKey::of::<bool>],
    priority: 0,
    factory: bool_factory,
};

#[distributed_slice(BUILTIN_PARSERS)]
static STRING: ParserRegistration = ParserRegistration {
    name: "string",
    types: &[TypeKey::of::<String>],
    priority: 0,
    factory: string_factory,
};

#[distributed_slice(BUILTIN_PARSERS)]
static CHAR: ParserRegistration = ParserRegistration {
    name: "char",
    types: &[TypeKey::of::<char>],
    priority: 0,
    factory: char_factory,
};
