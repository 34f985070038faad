//! Contract adapters: host contracts implemented by script functions.
//!
//! An adapter is built once per `implement` call. Its dispatch map is keyed
//! by operation signature and fixed at construction; operations without a
//! script function fall back to the contract's default body.

use std::fmt;
use std::rc::Rc;

use luabridge_host::{
    ContractObject, HostFault, HostValue, Kind, Operation, OperationRef, Prim, TypeDescriptor,
};
use mlua::{Function, Lua, MultiValue, Table, Value, WeakLua};
use rustc_hash::FxHashMap;

use crate::bridge::Bridge;
use crate::convert::{lossy, narrow_float, narrow_integer, single_char, to_host, to_script};
use crate::errors::{
    expected_named, host_operation, implementation_missing, into_fault, type_mismatch,
    BridgeError, BridgeResult,
};

/// Script-backed implementation of a host contract.
pub struct ContractAdapter {
    contract: Rc<TypeDescriptor>,
    functions: FxHashMap<OperationRef, Function>,
    bridge: Rc<Bridge>,
    lua: WeakLua,
}

impl ContractAdapter {
    fn new(
        bridge: &Rc<Bridge>,
        lua: &Lua,
        contract: Rc<TypeDescriptor>,
        functions: FxHashMap<OperationRef, Function>,
    ) -> HostValue {
        tracing::debug!(
            contract = contract.name(),
            bound = functions.len(),
            "implemented contract"
        );
        HostValue::Adapter(Rc::new(ContractAdapter {
            contract,
            functions,
            bridge: Rc::clone(bridge),
            lua: lua.weak(),
        }))
    }

    /// Whether a script function is bound to `signature`.
    pub fn is_bound(&self, signature: &OperationRef) -> bool {
        self.functions.contains_key(signature)
    }

    fn dispatch(
        &self,
        this: &HostValue,
        op: &Operation,
        args: Vec<HostValue>,
    ) -> BridgeResult<HostValue> {
        if let Some(function) = self.functions.get(&op.signature()) {
            return self.call_script(function, op, args);
        }
        if op.has_body() {
            return op
                .invoke_body(this, args)
                .map_err(|fault| host_operation(op.signature().to_string(), fault));
        }
        Err(implementation_missing(op.name()))
    }

    fn call_script(
        &self,
        function: &Function,
        op: &Operation,
        args: Vec<HostValue>,
    ) -> BridgeResult<HostValue> {
        let lua = self.lua.try_upgrade().ok_or_else(|| {
            BridgeError::Script(mlua::Error::RuntimeError(
                "script engine has been dropped".to_string(),
            ))
        })?;
        let script_args = args
            .into_iter()
            .map(|arg| to_script(&self.bridge, &lua, arg))
            .collect::<BridgeResult<Vec<_>>>()?;
        let results: MultiValue = function.call(MultiValue::from_vec(script_args))?;
        let first = results.into_iter().next().unwrap_or(Value::Nil);
        convert_return(&self.bridge, &lua, &first, op.return_kind())
    }
}

impl ContractObject for ContractAdapter {
    fn contract(&self) -> &Rc<TypeDescriptor> {
        &self.contract
    }

    fn call(
        &self,
        this: &HostValue,
        operation: &Operation,
        args: Vec<HostValue>,
    ) -> Result<HostValue, HostFault> {
        self.dispatch(this, operation, args).map_err(into_fault)
    }
}

impl fmt::Debug for ContractAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractAdapter")
            .field("contract", &self.contract.name())
            .field("bound", &self.functions.len())
            .finish_non_exhaustive()
    }
}

/// Build an adapter for `contract` from a table of script functions.
///
/// `only` restricts the operations that must be implemented to the given
/// names; by default every instance operation must be. Operations with a
/// default body may be left out.
pub fn implement(
    bridge: &Rc<Bridge>,
    lua: &Lua,
    contract: &Rc<TypeDescriptor>,
    table: &Table,
    only: Option<&[String]>,
) -> BridgeResult<HostValue> {
    if !contract.is_contract() {
        return Err(expected_named("contract", contract.name()));
    }
    let mut functions = FxHashMap::default();
    let requested = contract
        .instance_operations()
        .filter(|op| only.map_or(true, |names| names.iter().any(|n| n == op.name())));
    for op in requested {
        match table.get::<Value>(op.name())? {
            Value::Function(function) => {
                functions.insert(op.signature(), function);
            }
            _ if op.has_body() => {}
            _ => return Err(implementation_missing(op.name())),
        }
    }
    Ok(ContractAdapter::new(bridge, lua, Rc::clone(contract), functions))
}

/// Satisfy a functional contract with a single script function.
pub fn implement_function(
    bridge: &Rc<Bridge>,
    lua: &Lua,
    contract_name: &str,
    function: Function,
) -> BridgeResult<HostValue> {
    let contract = bridge.lookup_type(contract_name)?;
    let Some(op) = contract.functional_operation() else {
        return Err(type_mismatch(&Kind::contract(contract_name), "function"));
    };
    let mut functions = FxHashMap::default();
    functions.insert(op.signature(), function);
    Ok(ContractAdapter::new(bridge, lua, contract, functions))
}

/// Convert a script function's first result by the declared return kind.
fn convert_return(
    bridge: &Rc<Bridge>,
    lua: &Lua,
    value: &Value,
    kind: &Kind,
) -> BridgeResult<HostValue> {
    match kind {
        Kind::Void => Ok(HostValue::Null),
        Kind::Prim(Prim::Bool) | Kind::Boxed(Prim::Bool) => Ok(HostValue::Bool(truthy(value))),
        Kind::Prim(Prim::Char) | Kind::Boxed(Prim::Char) => char_result(value, kind),
        Kind::Prim(prim) | Kind::Boxed(prim) => match value {
            Value::Integer(i) => Ok(narrow_integer(*i, *prim)),
            Value::Number(n) => Ok(narrow_float(*n, *prim)),
            other => Err(type_mismatch(kind, other.type_name())),
        },
        other => to_host(bridge, lua, value, other),
    }
}

fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Nil | Value::Boolean(false))
}

/// A one-character string, or a number taken as a code point.
fn char_result(value: &Value, kind: &Kind) -> BridgeResult<HostValue> {
    let c = match value {
        Value::String(s) => single_char(&lossy(s)),
        Value::Integer(i) => u32::try_from(*i).ok().and_then(char::from_u32),
        Value::Number(n) => match narrow_float(*n, Prim::Long) {
            HostValue::Long(i) => u32::try_from(i).ok().and_then(char::from_u32),
            _ => None,
        },
        _ => None,
    };
    c.map(HostValue::Char)
        .ok_or_else(|| type_mismatch(kind, value.type_name()))
}
