//! Runtime type descriptions for custom-id fields.
//!
//! Parsers are looked up by type at runtime, so every custom-id field type
//! describes itself through [`Reflect`]. A [`FieldType`] carries:
//!
//! - the concrete type key, used for exact registry matches and for checking
//!   explicit parsers;
//! - an optional *origin* for generic containers (`Option<T>` looks up the
//!   `OptionOf` entry and resolves `T` recursively);
//! - declared *bases*, the types a registry entry may be registered against
//!   instead of this exact type;
//! - *adapters*, monomorphized helpers that let a type-erased parser build
//!   and inspect values of the concrete type.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use compass_core::{
    ButtonStyle, Channel, Emoji, Guild, Invite, Member, Message, Object, PartialEmoji,
    PartialMessage, Role, SelectOption, Snowflake, Sticker, User,
};

use crate::error::{ParseError, ParseResult};

/// An owned, type-erased field value.
pub type AnyValue = Box<dyn Any + Send + Sync>;

/// A borrowed, type-erased field value.
pub type DynValue = dyn Any + Send + Sync;

/// Moves a concrete value out of an [`AnyValue`].
pub fn downcast<T: Any>(value: AnyValue) -> ParseResult<T> {
    value
        .downcast::<T>()
        .map(|v| *v)
        .map_err(|_| ParseError::type_mismatch::<T>("<erased value>"))
}

/// Borrows a concrete value from a [`DynValue`].
pub fn downcast_ref<T: Any>(value: &DynValue) -> ParseResult<&T> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| ParseError::type_mismatch::<T>("<erased value>"))
}

// =============================================================================
// TypeKey
// =============================================================================

/// Identity of a Rust type, with its name kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path, e.g. `MyButton`.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    let base = name.split('<').next().unwrap_or(name);
    let start = base.rfind("::").map_or(0, |i| i + 2);
    &name[start..]
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// =============================================================================
// Markers
// =============================================================================

/// Registry markers for generic origins and abstract bases.
///
/// These types are never instantiated; they only name registry entries.
pub mod markers {
    /// Origin of `Option<T>`.
    pub enum OptionOf {}
    /// Origin of `Vec<T>`.
    pub enum VecOf {}
    /// Origin of [`Either<L, R>`](super::Either).
    pub enum EitherOf {}
    /// Base of every [`FromSnowflake`](super::FromSnowflake) type.
    pub enum AnySnowflake {}
    /// Base of every [`ParseEnum`](super::ParseEnum) type.
    pub enum AnyEnum {}
}

// =============================================================================
// FieldType
// =============================================================================

/// Runtime description of a field's type.
#[derive(Clone)]
pub struct FieldType {
    key: TypeKey,
    origin: Option<TypeKey>,
    bases: Vec<TypeKey>,
    args: Vec<FieldType>,
    adapters: Vec<(TypeId, Arc<dyn Any + Send + Sync>)>,
}

impl FieldType {
    /// A plain type with no origin, bases or arguments.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            origin: None,
            bases: Vec::new(),
            args: Vec::new(),
            adapters: Vec::new(),
        }
    }

    /// Marks this type as an instance of generic origin `O`.
    pub fn with_origin<O: ?Sized + 'static>(mut self) -> Self {
        self.origin = Some(TypeKey::of::<O>());
        self
    }

    /// Declares `B` as a base this type may be parsed as.
    pub fn with_base<B: ?Sized + 'static>(mut self) -> Self {
        self.bases.push(TypeKey::of::<B>());
        self
    }

    pub fn with_arg(mut self, arg: FieldType) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_adapter<A: Any + Send + Sync>(mut self, adapter: A) -> Self {
        self.adapters.push((TypeId::of::<A>(), Arc::new(adapter)));
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.name
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.key.id == TypeId::of::<T>()
    }

    /// Key used for exact registry lookup: the origin for generic types.
    pub fn lookup_key(&self) -> TypeKey {
        self.origin.unwrap_or(self.key)
    }

    pub fn bases(&self) -> &[TypeKey] {
        &self.bases
    }

    pub fn args(&self) -> &[FieldType] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> ParseResult<&FieldType> {
        self.args.get(index).ok_or(ParseError::NoParser(self.key.name))
    }

    pub fn adapter<A: Any>(&self) -> Option<&A> {
        self.adapters
            .iter()
            .find(|(id, _)| *id == TypeId::of::<A>())
            .and_then(|(_, a)| a.downcast_ref::<A>())
    }

    /// Like [`adapter`](Self::adapter), failing with `NoParser`.
    pub fn require_adapter<A: Any>(&self) -> ParseResult<&A> {
        self.adapter::<A>().ok_or(ParseError::NoParser(self.key.name))
    }

    /// Description of a [`FromSnowflake`] type.
    pub fn snowflake_like<T: FromSnowflake>() -> Self {
        Self::of::<T>()
            .with_base::<markers::AnySnowflake>()
            .with_adapter(SnowflakeAdapter {
                from_id: |id| Box::new(T::from_snowflake(id)),
                id: |value| downcast_ref::<T>(value).map(T::snowflake),
            })
    }

    /// Description of a [`ParseEnum`] type.
    pub fn enumeration<T: ParseEnum>() -> Self {
        Self::of::<T>()
            .with_base::<markers::AnyEnum>()
            .with_adapter(EnumAdapter {
                from_discriminant: |value| {
                    T::from_discriminant(value).map(|v| Box::new(v) as AnyValue)
                },
                discriminant: |value| downcast_ref::<T>(value).map(T::discriminant),
            })
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldType")
            .field("key", &self.key)
            .field("origin", &self.origin)
            .field("bases", &self.bases)
            .field("args", &self.args)
            .finish()
    }
}

// =============================================================================
// Reflect
// =============================================================================

/// Types that can be used as custom-id fields.
///
/// Implemented for primitives, `String`, platform objects and the generic
/// containers `Option`, `Vec` and [`Either`]. Enums get an implementation
/// from `#[derive(ParseEnum)]`; id-only references implement
/// [`FromSnowflake`] and return [`FieldType::snowflake_like`].
pub trait Reflect: Send + Sync + 'static {
    fn field_type() -> FieldType;
}

macro_rules! impl_reflect_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn field_type() -> FieldType {
                    FieldType::of::<$ty>()
                }
            }
        )*
    };
}

impl_reflect_leaf!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
    String, Snowflake, User, Member, Guild, Channel, Role, Message, PartialMessage, Invite,
    Emoji, Sticker, PartialEmoji, ButtonStyle, SelectOption,
);

/// A value of one of two types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

// ─── Container adapters ───

/// Builds and inspects `Option<T>` values.
#[derive(Clone, Copy)]
pub struct OptionAdapter {
    pub some: fn(AnyValue) -> ParseResult<AnyValue>,
    pub none: fn() -> AnyValue,
    pub get: fn(&DynValue) -> ParseResult<Option<&DynValue>>,
}

/// Builds and inspects `Vec<T>` values.
#[derive(Clone, Copy)]
pub struct VecAdapter {
    pub collect: fn(Vec<AnyValue>) -> ParseResult<AnyValue>,
    pub items: fn(&DynValue) -> ParseResult<Vec<&DynValue>>,
}

/// Builds and inspects `Either<L, R>` values.
#[derive(Clone, Copy)]
pub struct EitherAdapter {
    pub left: fn(AnyValue) -> ParseResult<AnyValue>,
    pub right: fn(AnyValue) -> ParseResult<AnyValue>,
    pub split: fn(&DynValue) -> ParseResult<Either<&DynValue, &DynValue>>,
}

/// Builds and inspects [`FromSnowflake`] values.
#[derive(Clone, Copy)]
pub struct SnowflakeAdapter {
    pub from_id: fn(Snowflake) -> AnyValue,
    pub id: fn(&DynValue) -> ParseResult<Snowflake>,
}

/// Builds and inspects [`ParseEnum`] values.
#[derive(Clone, Copy)]
pub struct EnumAdapter {
    pub from_discriminant: fn(i64) -> Option<AnyValue>,
    pub discriminant: fn(&DynValue) -> ParseResult<i64>,
}

impl<T: Reflect> Reflect for Option<T> {
    fn field_type() -> FieldType {
        FieldType::of::<Option<T>>()
            .with_origin::<markers::OptionOf>()
            .with_arg(T::field_type())
            .with_adapter(OptionAdapter {
                some: |value| Ok(Box::new(Some(downcast::<T>(value)?))),
                none: || Box::new(None::<T>),
                get: |value| {
                    let option = downcast_ref::<Option<T>>(value)?;
                    Ok(option.as_ref().map(|v| v as &DynValue))
                },
            })
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::of::<Vec<T>>()
            .with_origin::<markers::VecOf>()
            .with_arg(T::field_type())
            .with_adapter(VecAdapter {
                collect: |values| {
                    let items = values
                        .into_iter()
                        .map(downcast::<T>)
                        .collect::<ParseResult<Vec<T>>>()?;
                    Ok(Box::new(items))
                },
                items: |value| {
                    let items = downcast_ref::<Vec<T>>(value)?;
                    Ok(items.iter().map(|v| v as &DynValue).collect())
                },
            })
    }
}

impl<L: Reflect, R: Reflect> Reflect for Either<L, R> {
    fn field_type() -> FieldType {
        FieldType::of::<Either<L, R>>()
            .with_origin::<markers::EitherOf>()
            .with_arg(L::field_type())
            .with_arg(R::field_type())
            .with_adapter(EitherAdapter {
                left: |value| Ok(Box::new(Either::<L, R>::Left(downcast::<L>(value)?))),
                right: |value| Ok(Box::new(Either::<L, R>::Right(downcast::<R>(value)?))),
                split: |value| {
                    Ok(match downcast_ref::<Either<L, R>>(value)? {
                        Either::Left(l) => Either::Left(l as &DynValue),
                        Either::Right(r) => Either::Right(r as &DynValue),
                    })
                },
            })
    }
}

// =============================================================================
// Abstract bases
// =============================================================================

/// Types that are fully described by a platform id.
pub trait FromSnowflake: Send + Sync + Sized + 'static {
    fn from_snowflake(id: Snowflake) -> Self;

    fn snowflake(&self) -> Snowflake;
}

impl FromSnowflake for Object {
    fn from_snowflake(id: Snowflake) -> Self {
        Object { id }
    }

    fn snowflake(&self) -> Snowflake {
        self.id
    }
}

impl Reflect for Object {
    fn field_type() -> FieldType {
        FieldType::snowflake_like::<Object>()
    }
}

/// Fieldless enums encoded by their discriminant.
///
/// Usually derived with `#[derive(ParseEnum)]`.
pub trait ParseEnum: Send + Sync + Sized + 'static {
    fn discriminant(&self) -> i64;

    fn from_discriminant(value: i64) -> Option<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_strips_path_and_generics() {
        assert_eq!(TypeKey::of::<Snowflake>().short_name(), "Snowflake");
        assert_eq!(short_type_name("a::b::Wrapper<c::D>"), "Wrapper<c::D>");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_option_type_uses_origin_for_lookup() {
        let ty = <Option<i64>>::field_type();
        assert!(ty.is::<Option<i64>>());
        assert_eq!(ty.lookup_key(), TypeKey::of::<markers::OptionOf>());
        assert!(ty.args()[0].is::<i64>());
    }

    #[test]
    fn test_option_adapter_round_trips_values() {
        let ty = <Option<u8>>::field_type();
        let adapter = ty.adapter::<OptionAdapter>().unwrap();

        let some = (adapter.some)(Box::new(3u8)).unwrap();
        let inner = (adapter.get)(some.as_ref()).unwrap().unwrap();
        assert_eq!(inner.downcast_ref::<u8>(), Some(&3));

        let none = (adapter.none)();
        assert!((adapter.get)(none.as_ref()).unwrap().is_none());

        assert!((adapter.some)(Box::new("wrong")).is_err());
    }

    #[test]
    fn test_snowflake_like_declares_base() {
        let ty = Object::field_type();
        assert_eq!(ty.bases(), &[TypeKey::of::<markers::AnySnowflake>()]);
        let adapter = ty.adapter::<SnowflakeAdapter>().unwrap();
        let value = (adapter.from_id)(Snowflake(9));
        assert_eq!((adapter.id)(value.as_ref()).unwrap(), Snowflake(9));
    }
}
