//! The script-visible `Host` table.
//!
//! - `Host.type(name)` returns the type wrapper of a registered host type.
//! - `Host.implement(contract, table[, names])` builds a contract adapter
//!   from a table of functions. `contract` is a type name or a type wrapper;
//!   `names` optionally restricts which operations must be implemented.

use std::rc::Rc;

use luabridge_host::{HostValue, TypeDescriptor};
use mlua::{Lua, Table, Value};

use crate::bridge::Bridge;
use crate::contract::implement;
use crate::convert::{lossy, to_script, wrapped_target};
use crate::errors::{expected_named, BridgeResult};

/// Global name of the entry-point table.
pub const HOST_TABLE: &str = "Host";

/// Install the `Host` table into the globals of `lua`.
pub fn install(lua: &Lua, bridge: &Rc<Bridge>) -> BridgeResult<()> {
    let host = lua.create_table()?;

    let type_bridge = Rc::clone(bridge);
    let type_fn = lua.create_function(move |lua, name: String| {
        let descriptor = type_bridge.lookup_type(&name)?;
        to_script(&type_bridge, lua, HostValue::Type(descriptor)).map_err(mlua::Error::from)
    })?;
    host.set("type", type_fn)?;

    let implement_bridge = Rc::clone(bridge);
    let implement_fn = lua.create_function(
        move |lua, (contract, table, names): (Value, Table, Option<Table>)| {
            let descriptor = contract_descriptor(&implement_bridge, &contract)?;
            let names = names
                .map(|t| t.sequence_values::<String>().collect::<mlua::Result<Vec<_>>>())
                .transpose()?;
            let adapter = implement(&implement_bridge, lua, &descriptor, &table, names.as_deref())?;
            to_script(&implement_bridge, lua, adapter).map_err(mlua::Error::from)
        },
    )?;
    host.set("implement", implement_fn)?;

    lua.globals().set(HOST_TABLE, host)?;
    Ok(())
}

/// Resolve the contract argument of `Host.implement`.
fn contract_descriptor(bridge: &Bridge, contract: &Value) -> BridgeResult<Rc<TypeDescriptor>> {
    if let Value::String(name) = contract {
        return bridge.lookup_type(&lossy(name));
    }
    match wrapped_target(contract) {
        Some(HostValue::Type(descriptor)) => Ok(descriptor),
        Some(other) => Err(expected_named("type or type name", other.kind_name())),
        None => Err(expected_named("type or type name", contract.type_name())),
    }
}
