//! Values used for parameters a script call leaves out.

use luabridge_host::{HostValue, Kind, Prim};

/// Default for a missing argument of `kind`.
///
/// Primitives get their zero value; every nullable kind gets `Null`. The
/// variadic slot is filled separately with an empty array.
pub fn default_for(kind: &Kind) -> HostValue {
    match kind {
        Kind::Prim(prim) => match prim {
            Prim::Bool => HostValue::Bool(false),
            Prim::Byte => HostValue::Byte(0),
            Prim::Short => HostValue::Short(0),
            Prim::Int => HostValue::Int(0),
            Prim::Long => HostValue::Long(0),
            Prim::Float => HostValue::Float(0.0),
            Prim::Double => HostValue::Double(0.0),
            Prim::Char => HostValue::Char('\0'),
        },
        _ => HostValue::Null,
    }
}
