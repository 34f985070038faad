//! Coercion between script values and host values.
//!
//! [`to_script`] is total: scalars become Lua scalars, everything else gets a
//! fresh [`ObjectWrapper`]. [`to_host`] is driven by the target [`Kind`] and
//! either produces a value of that kind or fails with `TypeMismatch`; it never
//! mutates the script value it reads.
//!
//! # Numbers
//!
//! Lua integers and floats both coerce to every numeric primitive. Narrowing
//! follows host cast rules: floats truncate toward zero (saturating at the
//! `i64` range), then integers wrap to the target width. Numeric strings are
//! not numbers.

pub mod defaults;

use std::rc::Rc;

use luabridge_host::{HostArray, HostValue, Kind, Prim};
use mlua::{Function, Lua, Table, Value};

use crate::bridge::Bridge;
use crate::contract;
use crate::errors::{type_mismatch, BridgeResult};
use crate::wrapper::ObjectWrapper;

/// Bridge a host value into script space.
pub fn to_script(bridge: &Rc<Bridge>, lua: &Lua, value: HostValue) -> BridgeResult<Value> {
    Ok(match value {
        HostValue::Null => Value::Nil,
        HostValue::Bool(b) => Value::Boolean(b),
        HostValue::Byte(v) => Value::Integer(i64::from(v)),
        HostValue::Short(v) => Value::Integer(i64::from(v)),
        HostValue::Int(v) => Value::Integer(i64::from(v)),
        HostValue::Long(v) => Value::Integer(v),
        HostValue::Float(v) => Value::Number(f64::from(v)),
        HostValue::Double(v) => Value::Number(v),
        HostValue::Char(c) => Value::String(lua.create_string(c.encode_utf8(&mut [0; 4]))?),
        HostValue::Str(s) => Value::String(lua.create_string(&s)?),
        other => Value::UserData(bridge.wrap(lua, other)?),
    })
}

/// Coerce a script value to a host value of `kind`.
pub fn to_host(bridge: &Rc<Bridge>, lua: &Lua, value: &Value, kind: &Kind) -> BridgeResult<HostValue> {
    if let Some(target) = wrapped_target(value) {
        return unwrap_to(bridge, target, kind);
    }
    match kind {
        Kind::Void => Ok(HostValue::Null),
        Kind::Prim(prim) => to_prim(value, *prim, kind),
        Kind::Boxed(prim) => match value {
            Value::Nil => Ok(HostValue::Null),
            _ => to_prim(value, *prim, kind),
        },
        Kind::Str | Kind::CharSeq => match value {
            Value::Nil => Ok(HostValue::Null),
            Value::String(s) => Ok(HostValue::Str(lossy(s))),
            _ => Err(type_mismatch(kind, value.type_name())),
        },
        Kind::Array(element) => match value {
            Value::Nil => Ok(HostValue::Null),
            Value::Table(table) => table_to_array(bridge, lua, table, element),
            _ => Err(type_mismatch(kind, value.type_name())),
        },
        Kind::Contract(name) => match value {
            Value::Nil => Ok(HostValue::Null),
            Value::Function(function) => function_to_contract(bridge, lua, name, function),
            _ => Err(type_mismatch(kind, value.type_name())),
        },
        Kind::Object(_) => match value {
            Value::Nil => Ok(HostValue::Null),
            _ => Err(type_mismatch(kind, value.type_name())),
        },
        Kind::Any => to_any(value),
    }
}

/// Target of an object wrapper, if `value` is one.
pub(crate) fn wrapped_target(value: &Value) -> Option<HostValue> {
    match value {
        Value::UserData(ud) => ud
            .borrow::<ObjectWrapper>()
            .ok()
            .map(|wrapper| wrapper.target().clone()),
        _ => None,
    }
}

/// A wrapper passes through when its target already fits `kind`.
fn unwrap_to(bridge: &Bridge, target: HostValue, kind: &Kind) -> BridgeResult<HostValue> {
    let fits = match (kind, &target) {
        (Kind::Void, _) => return Ok(HostValue::Null),
        (Kind::Any, _) => true,
        (_, HostValue::Null) => kind.is_nullable(),
        (Kind::Prim(prim) | Kind::Boxed(prim), value) => prim_of(value) == Some(*prim),
        (Kind::Str | Kind::CharSeq, HostValue::Str(_)) => true,
        (Kind::Array(element), HostValue::Array(array)) => array.element_kind() == **element,
        (Kind::Contract(name) | Kind::Object(name), value) => {
            bridge.registry().is_instance(value, name)
        }
        _ => false,
    };
    if fits {
        Ok(target)
    } else {
        Err(type_mismatch(kind, target.kind_name()))
    }
}

fn prim_of(value: &HostValue) -> Option<Prim> {
    match value {
        HostValue::Bool(_) => Some(Prim::Bool),
        HostValue::Byte(_) => Some(Prim::Byte),
        HostValue::Short(_) => Some(Prim::Short),
        HostValue::Int(_) => Some(Prim::Int),
        HostValue::Long(_) => Some(Prim::Long),
        HostValue::Float(_) => Some(Prim::Float),
        HostValue::Double(_) => Some(Prim::Double),
        HostValue::Char(_) => Some(Prim::Char),
        _ => None,
    }
}

/// `expected` is the kind reported on mismatch (the boxed kind for boxed slots).
fn to_prim(value: &Value, prim: Prim, expected: &Kind) -> BridgeResult<HostValue> {
    match (prim, value) {
        (Prim::Bool, Value::Boolean(b)) => Ok(HostValue::Bool(*b)),
        (Prim::Char, Value::String(s)) => single_char(&lossy(s))
            .map(HostValue::Char)
            .ok_or_else(|| type_mismatch(expected, "string")),
        (prim, Value::Integer(i)) if prim.is_numeric() => Ok(narrow_integer(*i, prim)),
        (prim, Value::Number(n)) if prim.is_numeric() => Ok(narrow_float(*n, prim)),
        _ => Err(type_mismatch(expected, value.type_name())),
    }
}

/// Narrow a Lua integer to a numeric primitive.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "narrowing follows host cast rules"
)]
pub(crate) fn narrow_integer(value: i64, prim: Prim) -> HostValue {
    match prim {
        Prim::Byte => HostValue::Byte(value as i8),
        Prim::Short => HostValue::Short(value as i16),
        Prim::Int => HostValue::Int(value as i32),
        Prim::Float => HostValue::Float(value as f32),
        Prim::Double => HostValue::Double(value as f64),
        Prim::Long | Prim::Bool | Prim::Char => HostValue::Long(value),
    }
}

/// Narrow a Lua float to a numeric primitive.
///
/// Integral targets saturate at `int` width (`long` for `long`), then wrap
/// to `byte` and `short`. NaN becomes zero.
#[expect(
    clippy::cast_possible_truncation,
    reason = "`as` from float saturates; the int-to-byte/short step wraps"
)]
pub(crate) fn narrow_float(value: f64, prim: Prim) -> HostValue {
    match prim {
        Prim::Float => HostValue::Float(value as f32),
        Prim::Double => HostValue::Double(value),
        Prim::Byte => HostValue::Byte((value as i32) as i8),
        Prim::Short => HostValue::Short((value as i32) as i16),
        Prim::Int => HostValue::Int(value as i32),
        Prim::Long | Prim::Bool | Prim::Char => HostValue::Long(value as i64),
    }
}

fn to_any(value: &Value) -> BridgeResult<HostValue> {
    match value {
        Value::Nil => Ok(HostValue::Null),
        Value::Boolean(b) => Ok(HostValue::Bool(*b)),
        Value::Integer(i) => Ok(i32::try_from(*i).map_or(HostValue::Long(*i), HostValue::Int)),
        Value::Number(n) => Ok(HostValue::Double(*n)),
        Value::String(s) => Ok(HostValue::Str(lossy(s))),
        _ => Err(type_mismatch(&Kind::Any, value.type_name())),
    }
}

fn table_to_array(
    bridge: &Rc<Bridge>,
    lua: &Lua,
    table: &Table,
    element: &Kind,
) -> BridgeResult<HostValue> {
    let len = table.raw_len();
    let mut values = Vec::with_capacity(len);
    for index in 1..=len {
        let item: Value = table.raw_get(index)?;
        values.push(to_host(bridge, lua, &item, element)?);
    }
    HostArray::from_values(element, values)
        .map(HostValue::Array)
        .ok_or_else(|| type_mismatch(&Kind::array(element.clone()), "table"))
}

fn function_to_contract(
    bridge: &Rc<Bridge>,
    lua: &Lua,
    name: &str,
    function: &Function,
) -> BridgeResult<HostValue> {
    contract::implement_function(bridge, lua, name, function.clone())
}

pub(crate) fn lossy(s: &mlua::String) -> String {
    String::from(s.to_string_lossy())
}

pub(crate) fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
