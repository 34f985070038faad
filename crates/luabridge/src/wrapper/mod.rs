//! Script-side proxies for host values.
//!
//! An [`ObjectWrapper`] is the Lua userdata standing in for one host value
//! that is not a scalar: an array, a type, an opaque object or a contract
//! adapter. Script code talks to the host value only through the wrapper's
//! metamethods.
//!
//! # Member lookup
//!
//! Reads consult, in order: the wrapper's fallback side table, the member
//! dispatch table, `length` (arrays only), and fields. Members are bound to
//! their target and called with dot syntax: `point.move_by(1, 2)`.
//!
//! Writes to names the host does not publish (and array writes outside
//! `1..=length`) land in the side table instead of failing.
//!
//! # Identity
//!
//! Wrappers are not interned. Two wrappers of equal host values are equal
//! under `==` and hash the same.

mod members;

use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use luabridge_host::{Field, HostArray, HostValue, Receiver};
use mlua::{AnyUserData, Lua, MetaMethod, MultiValue, Table, UserData, UserDataMethods, Value};

use crate::bridge::Bridge;
use crate::convert::{to_host, to_script};
use crate::errors::{expected_named, host_operation, read_only_member, BridgeResult};
use crate::resolve::resolve;

pub use members::{MemberGroup, MemberTable};

const LENGTH: &str = "length";

/// Lua userdata owning one host value.
pub struct ObjectWrapper {
    bridge: Rc<Bridge>,
    target: HostValue,
    members: OnceCell<MemberTable>,
}

impl ObjectWrapper {
    pub(crate) fn new(bridge: Rc<Bridge>, target: HostValue) -> Self {
        ObjectWrapper {
            bridge,
            target,
            members: OnceCell::new(),
        }
    }

    /// The wrapped host value.
    pub fn target(&self) -> &HostValue {
        &self.target
    }

    /// Member dispatch table, built on first use.
    pub fn members(&self) -> &MemberTable {
        self.members
            .get_or_init(|| MemberTable::build(&self.bridge, &self.target))
    }

    fn array(&self) -> Option<&HostArray> {
        self.target.as_array()
    }

    /// Array length, for `#wrapper`.
    fn length(&self) -> BridgeResult<usize> {
        self.array()
            .map(HostArray::len)
            .ok_or_else(|| expected_named("array", self.target.kind_name()))
    }

    /// Field published under `name` for this target.
    fn field(&self, name: &str) -> Option<Field> {
        match &self.target {
            HostValue::Type(descriptor) => descriptor.field(name, Receiver::Static).cloned(),
            HostValue::Object(_) | HostValue::Adapter(_) => self
                .bridge
                .registry()
                .descriptor_of(&self.target)
                .and_then(|descriptor| descriptor.field(name, Receiver::Instance).cloned()),
            _ => None,
        }
    }

    fn read_element(&self, lua: &Lua, array: &HostArray, key: &Value) -> BridgeResult<Value> {
        match element_index(key, array.len()).and_then(|index| array.get(index)) {
            Some(element) => to_script(&self.bridge, lua, element),
            None => Ok(Value::Nil),
        }
    }

    fn read_member(&self, lua: &Lua, ud: &AnyUserData, name: &str) -> BridgeResult<Value> {
        if let Some(group) = self.members().get(name) {
            let function = bind_member(lua, ud, self, group.clone())?;
            return Ok(Value::Function(function));
        }
        if let Some(array) = self.array() {
            if name == LENGTH {
                return Ok(Value::Integer(len_as_integer(array.len())));
            }
        }
        if let Some(field) = self.field(name) {
            let value = field
                .get(&self.target)
                .map_err(|fault| host_operation(name, fault))?;
            return to_script(&self.bridge, lua, value);
        }
        Ok(Value::Nil)
    }

    /// Host-side write. Returns `false` when the key is not published and
    /// belongs in the side table.
    fn write(&self, lua: &Lua, key: &Value, value: &Value) -> BridgeResult<bool> {
        if let Some(array) = self.array() {
            if let Some(index) = element_index(key, array.len()) {
                let element = to_host(&self.bridge, lua, value, &array.element_kind())?;
                array
                    .set(index, element)
                    .map_err(|fault| host_operation("[]=", fault))?;
                return Ok(true);
            }
        }
        let Value::String(name) = key else {
            return Ok(false);
        };
        let name = crate::convert::lossy(name);
        if self.array().is_some() && name == LENGTH {
            return Err(read_only_member(LENGTH));
        }
        let Some(field) = self.field(&name) else {
            return Ok(false);
        };
        if field.is_read_only() {
            return Err(read_only_member(&name));
        }
        let host = to_host(&self.bridge, lua, value, field.kind())?;
        field
            .set(&self.target, host)
            .map_err(|fault| host_operation(name, fault))?;
        Ok(true)
    }
}

/// Zero-based element index for a one-based script key within `1..=len`.
fn element_index(key: &Value, len: usize) -> Option<usize> {
    let one_based = match *key {
        Value::Integer(i) => usize::try_from(i).ok()?,
        Value::Number(n) if n.fract() == 0.0 && n >= 1.0 => float_index(n),
        _ => return None,
    };
    (1..=len).contains(&one_based).then(|| one_based - 1)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "caller checked the float is a positive integer; `as` saturates"
)]
fn float_index(n: f64) -> usize {
    n as usize
}

fn len_as_integer(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

/// Create the script function for a member, bound to the wrapper's target.
///
/// A result that is the target itself comes back as the same userdata.
fn bind_member(
    lua: &Lua,
    ud: &AnyUserData,
    wrapper: &ObjectWrapper,
    group: MemberGroup,
) -> BridgeResult<mlua::Function> {
    let bridge = Rc::clone(&wrapper.bridge);
    let target = wrapper.target.clone();
    // The receiver is held weakly: the function may end up in the wrapper's
    // own side table.
    let receiver = weak_cell(lua, ud)?;
    let function = lua.create_function(move |lua, args: MultiValue| {
        let args: Vec<Value> = args.into_iter().collect();
        let resolved = resolve(
            &bridge,
            lua,
            group.role,
            &group.name,
            &group.candidates,
            &args,
        )?;
        let operation = resolved.operation;
        tracing::trace!(signature = %operation.signature(), "invoking host operation");
        let result = operation
            .invoke(&target, resolved.args)
            .map_err(|fault| host_operation(operation.signature().to_string(), fault))?;
        if result.same_instance(&target) {
            if let Some(ud) = receiver.raw_get::<Option<AnyUserData>>(1)? {
                return Ok(Value::UserData(ud));
            }
        }
        Ok(to_script(&bridge, lua, result)?)
    })?;
    Ok(function)
}

/// A one-slot table holding `ud` through a weak reference.
fn weak_cell(lua: &Lua, ud: &AnyUserData) -> mlua::Result<Table> {
    let mode = lua.create_table()?;
    mode.raw_set("__mode", "v")?;
    let cell = lua.create_table()?;
    cell.set_metatable(Some(mode));
    cell.raw_set(1, ud.clone())?;
    Ok(cell)
}

fn side_table(ud: &AnyUserData) -> mlua::Result<Option<Table>> {
    ud.user_value::<Option<Table>>()
}

fn index(lua: &Lua, ud: &AnyUserData, key: &Value) -> mlua::Result<Value> {
    if let Some(side) = side_table(ud)? {
        let stored: Value = side.raw_get(key.clone())?;
        if !stored.is_nil() {
            return Ok(stored);
        }
    }
    let wrapper = ud.borrow::<ObjectWrapper>()?;
    let value = match key {
        Value::Integer(_) | Value::Number(_) => match wrapper.array() {
            Some(array) => wrapper.read_element(lua, array, key)?,
            None => Value::Nil,
        },
        Value::String(name) => wrapper.read_member(lua, ud, &crate::convert::lossy(name))?,
        _ => Value::Nil,
    };
    Ok(value)
}

fn new_index(lua: &Lua, ud: &AnyUserData, key: Value, value: Value) -> mlua::Result<()> {
    let handled = ud.borrow::<ObjectWrapper>()?.write(lua, &key, &value)?;
    if handled {
        return Ok(());
    }
    let side = match side_table(ud)? {
        Some(side) => side,
        None => {
            let side = lua.create_table()?;
            ud.set_user_value(side.clone())?;
            side
        }
    };
    side.raw_set(key, value)
}

fn wrappers_equal(a: &AnyUserData, b: &AnyUserData) -> bool {
    match (a.borrow::<ObjectWrapper>(), b.borrow::<ObjectWrapper>()) {
        (Ok(a), Ok(b)) => *a == *b,
        _ => false,
    }
}

impl UserData for ObjectWrapper {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_function(MetaMethod::Index, |lua, (ud, key): (AnyUserData, Value)| {
            index(lua, &ud, &key)
        });
        methods.add_meta_function(
            MetaMethod::NewIndex,
            |lua, (ud, key, value): (AnyUserData, Value, Value)| new_index(lua, &ud, key, value),
        );
        methods.add_meta_method(MetaMethod::Len, |_, this, ()| {
            Ok(len_as_integer(this.length()?))
        });
        methods.add_meta_function(MetaMethod::Eq, |_, (a, b): (AnyUserData, AnyUserData)| {
            Ok(wrappers_equal(&a, &b))
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(this.target.to_string())
        });
    }
}

impl PartialEq for ObjectWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.target.host_eq(&other.target)
    }
}

impl Eq for ObjectWrapper {}

impl Hash for ObjectWrapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target.hash(state);
    }
}

impl fmt::Display for ObjectWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.target, f)
    }
}

impl fmt::Debug for ObjectWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectWrapper")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
