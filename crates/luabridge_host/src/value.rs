//! Host values.
//!
//! [`HostValue`] is everything that can originate on the host side of the
//! bridge: scalars, strings, arrays, type descriptors, opaque objects and
//! script-backed contract adapters.
//!
//! # Identity and equality
//!
//! Equality follows host semantics, not structural comparison:
//! - scalars and strings compare by value (floats by bit pattern)
//! - arrays, type descriptors and adapters compare by reference
//! - objects delegate to [`HostInstance::host_eq`]
//!
//! `Hash` is consistent with this equality, so two wrappers around equal host
//! values hash the same.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::FxHasher;

use crate::array::HostArray;
use crate::descriptor::{Operation, TypeDescriptor};
use crate::fault::HostFault;
use crate::kind::Kind;

/// Payload of an opaque host object.
///
/// The defaults give reference identity: an instance is only equal to
/// itself and hashes by address. Value-like host types override
/// [`host_eq`](Self::host_eq) and [`host_hash`](Self::host_hash) together.
pub trait HostInstance: Any + fmt::Debug {
    /// Registered type name of the instance's runtime type.
    fn type_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn host_eq(&self, other: &dyn HostInstance) -> bool {
        std::ptr::addr_eq(self as *const Self, other as *const dyn HostInstance)
    }

    fn host_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        (self as *const Self).cast::<()>().hash(&mut hasher);
        hasher.finish()
    }

    /// Host string conversion; `None` falls back to `Type@address`.
    fn describe(&self) -> Option<String> {
        None
    }
}

/// A script-backed object satisfying a contract.
pub trait ContractObject: fmt::Debug {
    /// The contract this object satisfies.
    fn contract(&self) -> &Rc<TypeDescriptor>;

    /// The contract operation a call by name with `argc` arguments reaches.
    ///
    /// Picks the first operation of matching arity, else the first one
    /// declared under the name.
    fn select(&self, name: &str, argc: usize) -> Option<&Operation> {
        let mut named = self
            .contract()
            .instance_operations()
            .filter(|op| op.name() == name)
            .peekable();
        let first = named.peek().copied();
        named.find(|op| op.params().len() == argc).or(first)
    }

    /// Invoke `operation`, one of the contract's own operations, with `this`
    /// as the receiver.
    ///
    /// `this` is the [`HostValue::Adapter`] holding `self`, passed through so
    /// default bodies can receive it.
    fn call(
        &self,
        this: &HostValue,
        operation: &Operation,
        args: Vec<HostValue>,
    ) -> Result<HostValue, HostFault>;
}

/// Handle to an opaque host object.
#[derive(Clone)]
pub struct HostObject(Rc<dyn HostInstance>);

impl HostObject {
    pub fn new<T: HostInstance>(instance: T) -> Self {
        HostObject(Rc::new(instance))
    }

    pub fn from_rc(instance: Rc<dyn HostInstance>) -> Self {
        HostObject(instance)
    }

    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    pub fn instance(&self) -> &dyn HostInstance {
        self.0.as_ref()
    }

    /// Borrow the payload as a concrete host type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0).cast::<()>()
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Any value originating from the host side.
#[derive(Clone, Debug)]
pub enum HostValue {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
    Array(HostArray),
    Type(Rc<TypeDescriptor>),
    Object(HostObject),
    Adapter(Rc<dyn ContractObject>),
}

impl HostValue {
    pub fn string(s: impl Into<String>) -> Self {
        HostValue::Str(s.into())
    }

    pub fn object<T: HostInstance>(instance: T) -> Self {
        HostValue::Object(HostObject::new(instance))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Scalars cross the boundary directly, without an object wrapper.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            HostValue::Bool(_)
                | HostValue::Byte(_)
                | HostValue::Short(_)
                | HostValue::Int(_)
                | HostValue::Long(_)
                | HostValue::Float(_)
                | HostValue::Double(_)
                | HostValue::Char(_)
                | HostValue::Str(_)
        )
    }

    /// Description of the dynamic kind, used in type-mismatch diagnostics.
    pub fn kind_name(&self) -> String {
        match self {
            HostValue::Null => "null".to_string(),
            HostValue::Bool(_) => Kind::BOOL.to_string(),
            HostValue::Byte(_) => Kind::BYTE.to_string(),
            HostValue::Short(_) => Kind::SHORT.to_string(),
            HostValue::Int(_) => Kind::INT.to_string(),
            HostValue::Long(_) => Kind::LONG.to_string(),
            HostValue::Float(_) => Kind::FLOAT.to_string(),
            HostValue::Double(_) => Kind::DOUBLE.to_string(),
            HostValue::Char(_) => Kind::CHAR.to_string(),
            HostValue::Str(_) => Kind::Str.to_string(),
            HostValue::Array(array) => Kind::array(array.element_kind()).to_string(),
            HostValue::Type(_) => "type".to_string(),
            HostValue::Object(object) => object.type_name().to_string(),
            HostValue::Adapter(adapter) => adapter.contract().name().to_string(),
        }
    }

    pub fn as_array(&self) -> Option<&HostArray> {
        match self {
            HostValue::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Rc<TypeDescriptor>> {
        match self {
            HostValue::Type(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Integral payload widened to `i64`, for any integer-like variant.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            HostValue::Byte(v) => Some(i64::from(v)),
            HostValue::Short(v) => Some(i64::from(v)),
            HostValue::Int(v) => Some(i64::from(v)),
            HostValue::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Floating payload widened to `f64`, for any numeric variant.
    #[expect(
        clippy::cast_precision_loss,
        reason = "host long to double follows host widening rules"
    )]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            HostValue::Float(v) => Some(f64::from(v)),
            HostValue::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Reference identity. Scalars are never the "same instance".
    pub fn same_instance(&self, other: &HostValue) -> bool {
        match (self, other) {
            (HostValue::Array(a), HostValue::Array(b)) => a.ptr_eq(b),
            (HostValue::Type(a), HostValue::Type(b)) => Rc::ptr_eq(a, b),
            (HostValue::Object(a), HostValue::Object(b)) => a.ptr_eq(b),
            (HostValue::Adapter(a), HostValue::Adapter(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }

    /// Host equality semantics.
    pub fn host_eq(&self, other: &HostValue) -> bool {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Byte(a), HostValue::Byte(b)) => a == b,
            (HostValue::Short(a), HostValue::Short(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Long(a), HostValue::Long(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a.to_bits() == b.to_bits(),
            (HostValue::Double(a), HostValue::Double(b)) => a.to_bits() == b.to_bits(),
            (HostValue::Char(a), HostValue::Char(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => {
                a.ptr_eq(b) || a.instance().host_eq(b.instance())
            }
            _ => self.same_instance(other),
        }
    }

    /// Invoke a contract operation on a script adapter, selected by name and
    /// argument count.
    pub fn call_contract(
        &self,
        operation: &str,
        args: Vec<HostValue>,
    ) -> Result<HostValue, HostFault> {
        match self {
            HostValue::Adapter(adapter) => match adapter.select(operation, args.len()) {
                Some(op) => adapter.call(self, op, args),
                None => Err(HostFault::new(format!(
                    "contract {} has no operation `{operation}`",
                    adapter.contract().name()
                ))),
            },
            other => Err(HostFault::new(format!(
                "cannot call `{operation}` on {}: not a contract adapter",
                other.kind_name()
            ))),
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        self.host_eq(other)
    }
}

impl Eq for HostValue {}

impl Hash for HostValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            HostValue::Null => {}
            HostValue::Bool(v) => v.hash(state),
            HostValue::Byte(v) => v.hash(state),
            HostValue::Short(v) => v.hash(state),
            HostValue::Int(v) => v.hash(state),
            HostValue::Long(v) => v.hash(state),
            HostValue::Float(v) => v.to_bits().hash(state),
            HostValue::Double(v) => v.to_bits().hash(state),
            HostValue::Char(v) => v.hash(state),
            HostValue::Str(v) => v.hash(state),
            HostValue::Array(array) => array.addr().hash(state),
            HostValue::Type(descriptor) => Rc::as_ptr(descriptor).hash(state),
            HostValue::Object(object) => object.instance().host_hash().hash(state),
            HostValue::Adapter(adapter) => Rc::as_ptr(adapter).cast::<()>().hash(state),
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "null"),
            HostValue::Bool(v) => write!(f, "{v}"),
            HostValue::Byte(v) => write!(f, "{v}"),
            HostValue::Short(v) => write!(f, "{v}"),
            HostValue::Int(v) => write!(f, "{v}"),
            HostValue::Long(v) => write!(f, "{v}"),
            HostValue::Float(v) => write!(f, "{v}"),
            HostValue::Double(v) => write!(f, "{v}"),
            HostValue::Char(v) => write!(f, "{v}"),
            HostValue::Str(v) => write!(f, "{v}"),
            HostValue::Array(array) => {
                write!(f, "{}[]@{:p}", array.element_kind(), array.addr())
            }
            HostValue::Type(descriptor) => write!(f, "type {}", descriptor.name()),
            HostValue::Object(object) => match object.instance().describe() {
                Some(text) => write!(f, "{text}"),
                None => write!(f, "{}@{:p}", object.type_name(), object.addr()),
            },
            HostValue::Adapter(adapter) => write!(
                f,
                "{}@{:p}",
                adapter.contract().name(),
                Rc::as_ptr(adapter).cast::<()>()
            ),
        }
    }
}

macro_rules! impl_from_variant {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for HostValue {
                fn from(v: $ty) -> Self {
                    HostValue::$variant(v)
                }
            }
        )*
    };
}

impl_from_variant! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
    String => Str,
    HostArray => Array,
    Rc<TypeDescriptor> => Type,
    HostObject => Object,
}

impl From<&str> for HostValue {
    fn from(v: &str) -> Self {
        HostValue::Str(v.to_string())
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(HostValue::Null, Into::into)
    }
}
