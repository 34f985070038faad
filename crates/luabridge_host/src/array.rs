//! Host arrays.
//!
//! Arrays are shared, mutable, fixed-length sequences. Primitive element
//! kinds are stored unboxed; every other element kind stores `HostValue`s
//! tagged with the declared element kind. Cloning a [`HostArray`] clones the
//! handle; [`HostArray::deep_copy`] allocates a new array.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::fault::HostFault;
use crate::kind::{Kind, Prim};
use crate::value::HostValue;

/// Backing storage of a host array.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayData {
    Bool(Vec<bool>),
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Char(Vec<char>),
    /// Any non-primitive element kind.
    Ref { element: Kind, items: Vec<HostValue> },
}

/// Shared handle to a host array.
#[derive(Clone)]
pub struct HostArray(Rc<RefCell<ArrayData>>);

/// Collect `values` into a primitive vector, or `None` if any value has the wrong variant.
macro_rules! collect_prim {
    ($values:expr, $variant:ident) => {
        $values
            .into_iter()
            .map(|v| match v {
                HostValue::$variant(x) => Some(x),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(ArrayData::$variant)
    };
}

impl HostArray {
    pub fn new(data: ArrayData) -> Self {
        HostArray(Rc::new(RefCell::new(data)))
    }

    /// Reference-element array of the given element kind.
    pub fn of(element: Kind, items: Vec<HostValue>) -> Self {
        Self::new(ArrayData::Ref { element, items })
    }

    /// Zero-length array of the given element kind.
    pub fn empty(element: &Kind) -> Self {
        Self::from_values(element, Vec::new())
            .unwrap_or_else(|| Self::of(element.clone(), Vec::new()))
    }

    /// Build an array from values already coerced to `element`.
    ///
    /// Returns `None` when a primitive element kind receives a value of a
    /// different variant.
    pub fn from_values(element: &Kind, values: Vec<HostValue>) -> Option<Self> {
        let data = match element {
            Kind::Prim(Prim::Bool) => collect_prim!(values, Bool)?,
            Kind::Prim(Prim::Byte) => collect_prim!(values, Byte)?,
            Kind::Prim(Prim::Short) => collect_prim!(values, Short)?,
            Kind::Prim(Prim::Int) => collect_prim!(values, Int)?,
            Kind::Prim(Prim::Long) => collect_prim!(values, Long)?,
            Kind::Prim(Prim::Float) => collect_prim!(values, Float)?,
            Kind::Prim(Prim::Double) => collect_prim!(values, Double)?,
            Kind::Prim(Prim::Char) => collect_prim!(values, Char)?,
            other => ArrayData::Ref {
                element: other.clone(),
                items: values,
            },
        };
        Some(Self::new(data))
    }

    pub fn element_kind(&self) -> Kind {
        match &*self.0.borrow() {
            ArrayData::Bool(_) => Kind::BOOL,
            ArrayData::Byte(_) => Kind::BYTE,
            ArrayData::Short(_) => Kind::SHORT,
            ArrayData::Int(_) => Kind::INT,
            ArrayData::Long(_) => Kind::LONG,
            ArrayData::Float(_) => Kind::FLOAT,
            ArrayData::Double(_) => Kind::DOUBLE,
            ArrayData::Char(_) => Kind::CHAR,
            ArrayData::Ref { element, .. } => element.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match &*self.0.borrow() {
            ArrayData::Bool(v) => v.len(),
            ArrayData::Byte(v) => v.len(),
            ArrayData::Short(v) => v.len(),
            ArrayData::Int(v) => v.len(),
            ArrayData::Long(v) => v.len(),
            ArrayData::Float(v) => v.len(),
            ArrayData::Double(v) => v.len(),
            ArrayData::Char(v) => v.len(),
            ArrayData::Ref { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at zero-based `index`.
    pub fn get(&self, index: usize) -> Option<HostValue> {
        match &*self.0.borrow() {
            ArrayData::Bool(v) => v.get(index).copied().map(HostValue::Bool),
            ArrayData::Byte(v) => v.get(index).copied().map(HostValue::Byte),
            ArrayData::Short(v) => v.get(index).copied().map(HostValue::Short),
            ArrayData::Int(v) => v.get(index).copied().map(HostValue::Int),
            ArrayData::Long(v) => v.get(index).copied().map(HostValue::Long),
            ArrayData::Float(v) => v.get(index).copied().map(HostValue::Float),
            ArrayData::Double(v) => v.get(index).copied().map(HostValue::Double),
            ArrayData::Char(v) => v.get(index).copied().map(HostValue::Char),
            ArrayData::Ref { items, .. } => items.get(index).cloned(),
        }
    }

    /// Store `value` (already coerced to the element kind) at zero-based `index`.
    pub fn set(&self, index: usize, value: HostValue) -> Result<(), HostFault> {
        let len = self.len();
        if index >= len {
            return Err(HostFault::new(format!(
                "array index {index} out of bounds for length {len}"
            )));
        }
        let mut rejected = None;
        {
            let mut data = self.0.borrow_mut();
            match (&mut *data, value) {
                (ArrayData::Bool(v), HostValue::Bool(x)) => v[index] = x,
                (ArrayData::Byte(v), HostValue::Byte(x)) => v[index] = x,
                (ArrayData::Short(v), HostValue::Short(x)) => v[index] = x,
                (ArrayData::Int(v), HostValue::Int(x)) => v[index] = x,
                (ArrayData::Long(v), HostValue::Long(x)) => v[index] = x,
                (ArrayData::Float(v), HostValue::Float(x)) => v[index] = x,
                (ArrayData::Double(v), HostValue::Double(x)) => v[index] = x,
                (ArrayData::Char(v), HostValue::Char(x)) => v[index] = x,
                (ArrayData::Ref { items, .. }, x) => items[index] = x,
                (_, other) => rejected = Some(other),
            }
        }
        match rejected {
            None => Ok(()),
            Some(other) => Err(HostFault::new(format!(
                "cannot store {} in {}[]",
                other.kind_name(),
                self.element_kind()
            ))),
        }
    }

    /// New array of the same kind with copied contents.
    pub fn deep_copy(&self) -> Self {
        Self::new(self.0.borrow().clone())
    }

    /// Snapshot of all elements.
    pub fn to_values(&self) -> Vec<HostValue> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    /// Whether both handles refer to the same array.
    pub fn ptr_eq(&self, other: &HostArray) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0).cast::<()>()
    }
}

impl fmt::Debug for HostArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostArray").field(&*self.0.borrow()).finish()
    }
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for HostArray {
                fn from(v: Vec<$ty>) -> Self {
                    HostArray::new(ArrayData::$variant(v))
                }
            }
        )*
    };
}

impl_from_vec! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
}
