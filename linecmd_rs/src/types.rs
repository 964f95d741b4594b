//! Parameter types, the built-in coercion table and the type-parser registry.
//!
//! Every operation argument implements [`Argument`], which tells the binder
//! what to read ([`ParamType`]) and how to take the bound value back out.
//! Primitive types (booleans, characters, strings and all numeric kinds) are
//! coerced by a fixed table; anything else goes through a [`TypeParser`]
//! registered in [`TypeParsers`] for its exact type.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::binder::ParameterReader;
use crate::context::{CommandContext, Flags};
use crate::error::{CommandError, ParseErrorKind, Result};

/// A value produced by the binder, typed by the operation's signature.
pub type BoundValue = Box<dyn Any + Send>;

/// Types coerced by the built-in table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char,
    Str,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Str => "string",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub fn is_number(self) -> bool {
        !matches!(self, Self::Bool | Self::Char | Self::Str)
    }

    /// Coerce one raw token.
    ///
    /// Numbers parse through `f64` and are then narrowed with `as`, which
    /// saturates out-of-range values and maps NaN to zero.
    pub fn coerce(self, token: &str) -> std::result::Result<BoundValue, ParseErrorKind> {
        if self.is_number() {
            let number = token
                .trim()
                .parse::<f64>()
                .map_err(|_| ParseErrorKind::InvalidNumber {
                    token: token.to_string(),
                    expected: self.name(),
                })?;
            return Ok(self.narrow(number));
        }

        Ok(match self {
            Self::Bool => Box::new(token.eq_ignore_ascii_case("true")),
            Self::Char => Box::new(
                token
                    .chars()
                    .next()
                    .ok_or(ParseErrorKind::InvalidCharacter)?,
            ),
            _ => Box::new(token.to_string()),
        })
    }

    fn narrow(self, number: f64) -> BoundValue {
        match self {
            Self::I8 => Box::new(number as i8),
            Self::I16 => Box::new(number as i16),
            Self::I32 => Box::new(number as i32),
            Self::I64 => Box::new(number as i64),
            Self::Isize => Box::new(number as isize),
            Self::U8 => Box::new(number as u8),
            Self::U16 => Box::new(number as u16),
            Self::U32 => Box::new(number as u32),
            Self::U64 => Box::new(number as u64),
            Self::Usize => Box::new(number as usize),
            Self::F32 => Box::new(number as f32),
            _ => Box::new(number),
        }
    }
}

/// What the binder reads for one formal parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Primitive(PrimitiveKind),
    /// Delegated to the parser registered for this exact type.
    Custom { id: TypeId, name: &'static str },
    /// The invocation's flag map; consumes no token.
    Flags,
}

impl ParamType {
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::Primitive(kind) => Cow::Borrowed(kind.name()),
            Self::Custom { name, .. } => Cow::Owned(short_type_name(name)),
            Self::Flags => Cow::Borrowed("flags"),
        }
    }

    /// Whether binding this parameter reads from the positional tokens.
    pub fn takes_token(&self) -> bool {
        !matches!(self, Self::Flags)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Drop module paths from every path in a type name:
/// `alloc::vec::Vec<my::Point>` becomes `Vec<Point>`.
fn short_type_name(full: &str) -> String {
    let mut short = String::with_capacity(full.len());
    let mut rest = full;
    while !rest.is_empty() {
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
            .unwrap_or(rest.len());
        let (path, tail) = rest.split_at(end);
        short.push_str(path.rsplit("::").next().unwrap_or(path));
        let mut chars = tail.chars();
        if let Some(separator) = chars.next() {
            short.push(separator);
        }
        rest = chars.as_str();
    }
    short
}

/// A type that can appear in an operation's signature.
pub trait Argument: Sized + Send + 'static {
    fn param_type() -> ParamType;

    /// Take the bound value for parameter `index` back out.
    ///
    /// `None` means the binder had nothing for this slot.
    fn from_bound(value: Option<BoundValue>, index: usize) -> Result<Self>;
}

fn downcast<T: 'static>(
    value: Option<BoundValue>,
    index: usize,
    expected: ParamType,
) -> Result<T> {
    value
        .and_then(|value| value.downcast::<T>().ok())
        .map(|value| *value)
        .ok_or(CommandError::MissingArgument {
            index,
            expected: expected.name(),
        })
}

macro_rules! primitive_argument {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Argument for $ty {
                fn param_type() -> ParamType {
                    ParamType::Primitive(PrimitiveKind::$kind)
                }

                fn from_bound(value: Option<BoundValue>, index: usize) -> Result<Self> {
                    downcast(value, index, Self::param_type())
                }
            }
        )*
    };
}

primitive_argument! {
    bool => Bool,
    char => Char,
    String => Str,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
}

/// Optional parameter: receives `None` when the tokens run out.
impl<T: Argument> Argument for Option<T> {
    fn param_type() -> ParamType {
        T::param_type()
    }

    fn from_bound(value: Option<BoundValue>, index: usize) -> Result<Self> {
        match value {
            Some(value) => T::from_bound(Some(value), index).map(Some),
            None => Ok(None),
        }
    }
}

impl Argument for Flags {
    fn param_type() -> ParamType {
        ParamType::Flags
    }

    fn from_bound(value: Option<BoundValue>, _index: usize) -> Result<Self> {
        Ok(value
            .and_then(|value| value.downcast::<Flags>().ok())
            .map(|flags| *flags)
            .unwrap_or_default())
    }
}

/// A non-primitive argument produced by the [`TypeParser`] registered for `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T>(pub T);

impl<T> Parsed<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Send + 'static> Argument for Parsed<T> {
    fn param_type() -> ParamType {
        ParamType::Custom {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    fn from_bound(value: Option<BoundValue>, index: usize) -> Result<Self> {
        downcast(value, index, Self::param_type()).map(Parsed)
    }
}

/// Builds a `T` out of the invocation, reading as many tokens as it needs.
pub trait TypeParser<T>: Send + Sync {
    fn parse(&self, context: &CommandContext, reader: &mut ParameterReader<'_>) -> Result<T>;
}

type ErasedParser =
    Box<dyn Fn(&CommandContext, &mut ParameterReader<'_>) -> Result<BoundValue> + Send + Sync>;

/// Registry of type parsers, looked up by exact type identity.
#[derive(Default)]
pub struct TypeParsers {
    parsers: HashMap<TypeId, (&'static str, ErasedParser)>,
}

impl TypeParsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure parsing `T`. The first registration for a type wins.
    pub fn register<T, F>(&mut self, parser: F) -> bool
    where
        T: Send + 'static,
        F: Fn(&CommandContext, &mut ParameterReader<'_>) -> Result<T>
            + Send
            + Sync
            + 'static,
    {
        self.insert::<T>(Box::new(move |context, reader| {
            parser(context, reader).map(|value| Box::new(value) as BoundValue)
        }))
    }

    /// Register a [`TypeParser`] implementation for `T`.
    pub fn register_parser<T, P>(&mut self, parser: P) -> bool
    where
        T: Send + 'static,
        P: TypeParser<T> + 'static,
    {
        self.insert::<T>(Box::new(move |context, reader| {
            parser
                .parse(context, reader)
                .map(|value| Box::new(value) as BoundValue)
        }))
    }

    fn insert<T: 'static>(&mut self, parser: ErasedParser) -> bool {
        let id = TypeId::of::<T>();
        if self.parsers.contains_key(&id) {
            return false;
        }
        self.parsers.insert(id, (std::any::type_name::<T>(), parser));
        true
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.parsers.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Run the parser registered for `id`; `Ok(None)` when there is none.
    pub fn parse(
        &self,
        id: TypeId,
        context: &CommandContext,
        reader: &mut ParameterReader<'_>,
    ) -> Result<Option<BoundValue>> {
        match self.parsers.get(&id) {
            Some((_, parser)) => parser(context, reader).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for TypeParsers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.parsers.values().map(|(name, _)| name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce<T: 'static>(kind: PrimitiveKind, token: &str) -> T {
        *kind.coerce(token).unwrap().downcast::<T>().unwrap()
    }

    #[test]
    fn test_numbers_parse_through_double() {
        assert_eq!(coerce::<i32>(PrimitiveKind::I32, "42"), 42);
        assert_eq!(coerce::<i32>(PrimitiveKind::I32, "3.9"), 3);
        assert_eq!(coerce::<f64>(PrimitiveKind::F64, "1e3"), 1000.0);
        assert_eq!(coerce::<u8>(PrimitiveKind::U8, "300"), u8::MAX);
        assert_eq!(coerce::<i64>(PrimitiveKind::I64, "-7"), -7);
    }

    #[test]
    fn test_invalid_number() {
        let err = PrimitiveKind::I32.coerce("abc").err().unwrap();
        assert_eq!(
            err,
            ParseErrorKind::InvalidNumber {
                token: "abc".to_string(),
                expected: "i32"
            }
        );
    }

    #[test]
    fn test_bool_only_true_literal() {
        assert!(coerce::<bool>(PrimitiveKind::Bool, "TRUE"));
        assert!(coerce::<bool>(PrimitiveKind::Bool, "true"));
        assert!(!coerce::<bool>(PrimitiveKind::Bool, "yes"));
        assert!(!coerce::<bool>(PrimitiveKind::Bool, "1"));
    }

    #[test]
    fn test_char_and_string() {
        assert_eq!(coerce::<char>(PrimitiveKind::Char, "xyz"), 'x');
        assert_eq!(
            PrimitiveKind::Char.coerce("").err(),
            Some(ParseErrorKind::InvalidCharacter)
        );
        assert_eq!(coerce::<String>(PrimitiveKind::Str, "as is"), "as is");
    }

    #[test]
    fn test_param_type_names() {
        assert_eq!(i32::param_type().name(), "i32");
        assert_eq!(<Option<String>>::param_type().name(), "string");
        assert_eq!(Flags::param_type().name(), "flags");
        assert!(!Flags::param_type().takes_token());

        struct Point;
        assert_eq!(<Parsed<Point>>::param_type().name(), "Point");
        assert_eq!(<Parsed<Vec<Point>>>::param_type().name(), "Vec<Point>");
        assert_eq!(
            <Parsed<(Point, Option<String>)>>::param_type().to_string(),
            "(Point, Option<String>)"
        );
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("alloc::vec::Vec<a::B>"), "Vec<B>");
        assert_eq!(short_type_name("&[core::option::Option<u8>; 4]"), "&[Option<u8>; 4]");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_missing_value_for_required_argument() {
        let err = i32::from_bound(None, 1).unwrap_err();
        match err {
            CommandError::MissingArgument { index, expected } => {
                assert_eq!((index, &*expected), (1, "i32"));
            }
            other => panic!("expected MissingArgument, got {other:?}"),
        }
        assert_eq!(<Option<i32>>::from_bound(None, 1).unwrap(), None);
    }

    #[test]
    fn test_register_first_wins() {
        let mut parsers = TypeParsers::new();
        assert!(parsers.register(|_, _| Ok(1u128)));
        assert!(!parsers.register(|_, _| Ok(2u128)));
        assert!(parsers.contains::<u128>());
        assert_eq!(parsers.len(), 1);
    }
}
