//! Host value kinds.
//!
//! A [`Kind`] is the static shape a host operation publishes for a parameter,
//! a return value, a field, or an array element. The bridge coerces script
//! values by switching on the target kind, so every coercion rule is keyed
//! off this enum.

use std::fmt;

/// Primitive (unboxed) host kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Prim {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl Prim {
    /// Host-facing name of the primitive, as used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Prim::Bool => "boolean",
            Prim::Byte => "byte",
            Prim::Short => "short",
            Prim::Int => "int",
            Prim::Long => "long",
            Prim::Float => "float",
            Prim::Double => "double",
            Prim::Char => "char",
        }
    }

    /// Whether script numbers coerce to this primitive.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Prim::Bool | Prim::Char)
    }
}

/// Static kind of a host slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// No value (operation return only).
    Void,
    /// Unboxed primitive; never null.
    Prim(Prim),
    /// Nullable primitive.
    Boxed(Prim),
    /// Host string; nullable.
    Str,
    /// Abstract character sequence; accepts strings, nullable.
    CharSeq,
    /// Array with the given element kind.
    Array(Box<Kind>),
    /// Behavioral contract (interface), by registered type name.
    Contract(String),
    /// Opaque host object, by registered type name.
    Object(String),
    /// The universal "any object" kind.
    Any,
}

impl Kind {
    pub const BOOL: Kind = Kind::Prim(Prim::Bool);
    pub const BYTE: Kind = Kind::Prim(Prim::Byte);
    pub const SHORT: Kind = Kind::Prim(Prim::Short);
    pub const INT: Kind = Kind::Prim(Prim::Int);
    pub const LONG: Kind = Kind::Prim(Prim::Long);
    pub const FLOAT: Kind = Kind::Prim(Prim::Float);
    pub const DOUBLE: Kind = Kind::Prim(Prim::Double);
    pub const CHAR: Kind = Kind::Prim(Prim::Char);

    /// Array kind with the given element kind.
    pub fn array(element: Kind) -> Self {
        Kind::Array(Box::new(element))
    }

    /// Opaque object kind for a registered type name.
    pub fn object(type_name: impl Into<String>) -> Self {
        Kind::Object(type_name.into())
    }

    /// Contract kind for a registered contract name.
    pub fn contract(type_name: impl Into<String>) -> Self {
        Kind::Contract(type_name.into())
    }

    /// Element kind, for array kinds.
    pub fn element(&self) -> Option<&Kind> {
        match self {
            Kind::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Registered type name, for contract and object kinds.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Kind::Contract(name) | Kind::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Whether a slot of this kind can hold host null.
    pub fn is_nullable(&self) -> bool {
        !matches!(self, Kind::Prim(_) | Kind::Void)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Void => write!(f, "void"),
            Kind::Prim(p) => write!(f, "{}", p.name()),
            Kind::Boxed(p) => write!(f, "{}?", p.name()),
            Kind::Str => write!(f, "string"),
            Kind::CharSeq => write!(f, "char-sequence"),
            Kind::Array(element) => write!(f, "{element}[]"),
            Kind::Contract(name) | Kind::Object(name) => write!(f, "{name}"),
            Kind::Any => write!(f, "any"),
        }
    }
}
