//! Overload and constructor resolution.
//!
//! Candidates are tried in declaration order; there is no specificity
//! ranking. Resolution runs in two passes:
//!
//! 1. Arity-eligible candidates (exact parameter count, or variadic with at
//!    least the fixed count) are marshaled in order and the first success
//!    wins. If exactly one candidate was eligible, its marshaling error is
//!    returned as is.
//! 2. Otherwise every candidate is retried ignoring arity: missing positions
//!    take their defaults and surplus arguments are dropped.
//!
//! When both passes fail the result is `NoMatchingOverload`.

use std::fmt;
use std::rc::Rc;

use luabridge_host::{HostArray, HostValue, Kind, Operation};
use mlua::{Lua, Value};

use crate::bridge::Bridge;
use crate::convert::defaults::default_for;
use crate::convert::{to_host, wrapped_target};
use crate::errors::{no_matching_overload, type_mismatch, BridgeResult};

/// Whether a member dispatches over methods or constructors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverloadRole {
    Method,
    Constructor,
}

impl fmt::Display for OverloadRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverloadRole::Method => write!(f, "method"),
            OverloadRole::Constructor => write!(f, "constructor"),
        }
    }
}

/// The chosen operation and its marshaled arguments.
#[derive(Debug)]
pub struct Resolved<'a> {
    pub operation: &'a Operation,
    pub args: Vec<HostValue>,
}

/// Whether `op` can take `argc` arguments without defaults or drops.
pub fn is_arity_eligible(op: &Operation, argc: usize) -> bool {
    let declared = op.params().len();
    declared == argc || (op.is_variadic() && argc + 1 >= declared)
}

/// Pick the operation to run for a script call and marshal its arguments.
#[tracing::instrument(level = "trace", skip(bridge, lua, candidates, args), fields(argc = args.len()))]
pub fn resolve<'a>(
    bridge: &Rc<Bridge>,
    lua: &Lua,
    role: OverloadRole,
    name: &str,
    candidates: &'a [Operation],
    args: &[Value],
) -> BridgeResult<Resolved<'a>> {
    let eligible: Vec<&Operation> = candidates
        .iter()
        .filter(|op| is_arity_eligible(op, args.len()))
        .collect();

    let mut first_error = None;
    for &operation in &eligible {
        match marshal(bridge, lua, operation, args) {
            Ok(host_args) => {
                return Ok(Resolved {
                    operation,
                    args: host_args,
                });
            }
            Err(err) if err.is_cycle_limit() => return Err(err),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    if eligible.len() == 1 {
        if let Some(err) = first_error {
            return Err(err);
        }
    }

    for operation in candidates {
        match marshal(bridge, lua, operation, args) {
            Ok(host_args) => {
                tracing::trace!(signature = %operation.signature(), "relaxed overload match");
                return Ok(Resolved {
                    operation,
                    args: host_args,
                });
            }
            Err(err) if err.is_cycle_limit() => return Err(err),
            Err(_) => {}
        }
    }
    Err(no_matching_overload(role, name, args.len()))
}

/// Marshal script arguments for `op`.
///
/// Positions past the supplied arguments take [`default_for`]; surplus
/// arguments of non-variadic operations are dropped.
pub fn marshal(
    bridge: &Rc<Bridge>,
    lua: &Lua,
    op: &Operation,
    args: &[Value],
) -> BridgeResult<Vec<HostValue>> {
    let params = op.params();
    let (fixed, slot) = match params.split_last() {
        Some((last, fixed)) if op.is_variadic() => (fixed, Some(last)),
        _ => (params, None),
    };

    let mut host_args = Vec::with_capacity(params.len());
    for (index, kind) in fixed.iter().enumerate() {
        host_args.push(match args.get(index) {
            Some(value) => to_host(bridge, lua, value, kind)?,
            None => default_for(kind),
        });
    }
    if let Some(slot) = slot {
        let rest = args.get(fixed.len()..).unwrap_or_default();
        host_args.push(marshal_variadic(bridge, lua, slot, rest)?);
    }
    Ok(host_args)
}

/// Fill the variadic slot from the remaining arguments.
///
/// A single table or array wrapper is taken as the array itself; anything
/// else is coerced element-wise and packed.
fn marshal_variadic(
    bridge: &Rc<Bridge>,
    lua: &Lua,
    slot: &Kind,
    rest: &[Value],
) -> BridgeResult<HostValue> {
    if let [single] = rest {
        let is_array = match single {
            Value::Table(_) => true,
            other => matches!(wrapped_target(other), Some(HostValue::Array(_))),
        };
        if is_array {
            return to_host(bridge, lua, single, slot);
        }
    }
    let element = slot.element().unwrap_or(&Kind::Any);
    let values = rest
        .iter()
        .map(|value| to_host(bridge, lua, value, element))
        .collect::<BridgeResult<Vec<_>>>()?;
    HostArray::from_values(element, values)
        .map(HostValue::Array)
        .ok_or_else(|| type_mismatch(slot, "arguments"))
}
