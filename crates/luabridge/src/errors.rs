//! Bridge errors and their constructors.
//!
//! Every failure the bridge raises is a [`BridgeError`]. Constructors are
//! centralized here so call sites read as `type_mismatch(&kind, actual)`
//! rather than spelling out variants.
//!
//! # Crossing the engine boundary
//!
//! Inside Lua callbacks errors travel as `mlua::Error::ExternalError`, which
//! keeps them catchable by `pcall`. On the way back out, [`BridgeError::from`]
//! searches the engine's error chain for the original bridge error so callers
//! see `TypeMismatch` rather than an opaque runtime error.

use std::error::Error as StdError;

use luabridge_host::{HostFault, Kind};
use thiserror::Error;

use crate::resolve::OverloadRole;

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised by the value bridge.
#[derive(Clone, Debug, Error)]
pub enum BridgeError {
    #[error("TypeError: {expected} expected, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("no {role} `{name}` accepts {arg_count} argument(s)")]
    NoMatchingOverload {
        role: OverloadRole,
        name: String,
        arg_count: usize,
    },

    #[error("no implementation defined for operation `{operation}`")]
    ImplementationMissing { operation: String },

    #[error("unknown host type `{name}`")]
    UnknownSymbolicType { name: String },

    #[error("cycle limit exceeded (max {max_cycles})")]
    CycleLimitExceeded { max_cycles: i64 },

    #[error("host operation `{operation}` failed: {cause}")]
    HostOperation {
        operation: String,
        #[source]
        cause: HostFault,
    },

    #[error("member `{member}` is read-only")]
    ReadOnlyMember { member: String },

    #[error(transparent)]
    Script(mlua::Error),
}

impl BridgeError {
    /// Whether this is the sandbox's execution-budget fault.
    pub fn is_cycle_limit(&self) -> bool {
        matches!(self, BridgeError::CycleLimitExceeded { .. })
    }
}

// Constructors

#[cold]
pub fn type_mismatch(expected: &Kind, actual: impl Into<String>) -> BridgeError {
    expected_named(expected.to_string(), actual)
}

/// Mismatch against a non-kind expectation such as `"contract"`.
#[cold]
pub fn expected_named(expected: impl Into<String>, actual: impl Into<String>) -> BridgeError {
    BridgeError::TypeMismatch {
        expected: expected.into(),
        actual: actual.into(),
    }
}

#[cold]
pub fn no_matching_overload(role: OverloadRole, name: &str, arg_count: usize) -> BridgeError {
    BridgeError::NoMatchingOverload {
        role,
        name: name.to_string(),
        arg_count,
    }
}

#[cold]
pub fn implementation_missing(operation: &str) -> BridgeError {
    BridgeError::ImplementationMissing {
        operation: operation.to_string(),
    }
}

#[cold]
pub fn unknown_symbolic_type(name: &str) -> BridgeError {
    BridgeError::UnknownSymbolicType {
        name: name.to_string(),
    }
}

#[cold]
pub fn cycle_limit_exceeded(max_cycles: i64) -> BridgeError {
    BridgeError::CycleLimitExceeded { max_cycles }
}

#[cold]
pub fn host_operation(operation: impl Into<String>, cause: HostFault) -> BridgeError {
    BridgeError::HostOperation {
        operation: operation.into(),
        cause,
    }
}

#[cold]
pub fn read_only_member(member: &str) -> BridgeError {
    BridgeError::ReadOnlyMember {
        member: member.to_string(),
    }
}

// Engine boundary

impl From<BridgeError> for mlua::Error {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Script(inner) => inner,
            other => mlua::Error::external(other),
        }
    }
}

impl From<mlua::Error> for BridgeError {
    fn from(err: mlua::Error) -> Self {
        let mut found = Vec::new();
        collect_lua(&err, &mut found);
        if let Some(limit) = found.iter().find(|e| e.is_cycle_limit()) {
            return limit.clone();
        }
        found
            .into_iter()
            .next()
            .unwrap_or(BridgeError::Script(err))
    }
}

/// Wrap a bridge error as a host fault, preserving it as the source.
pub(crate) fn into_fault(err: BridgeError) -> HostFault {
    HostFault::from_error(err)
}

/// Collect bridge errors reachable from an engine error, outermost first.
fn collect_lua(err: &mlua::Error, found: &mut Vec<BridgeError>) {
    match err {
        mlua::Error::CallbackError { cause, .. }
        | mlua::Error::WithContext { cause, .. }
        | mlua::Error::BadArgument { cause, .. } => collect_lua(cause, found),
        mlua::Error::ExternalError(inner) => collect_source(&**inner, found),
        _ => {}
    }
}

/// Walk a std error chain until the first bridge or engine error.
fn collect_source(err: &(dyn StdError + 'static), found: &mut Vec<BridgeError>) {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(bridge) = e.downcast_ref::<BridgeError>() {
            collect_bridge(bridge, found);
            return;
        }
        if let Some(lua) = e.downcast_ref::<mlua::Error>() {
            collect_lua(lua, found);
            return;
        }
        current = e.source();
    }
}

fn collect_bridge(err: &BridgeError, found: &mut Vec<BridgeError>) {
    found.push(err.clone());
    match err {
        BridgeError::HostOperation { cause, .. } => {
            if let Some(inner) = cause.cause() {
                collect_source(inner, found);
            }
        }
        BridgeError::Script(inner) => collect_lua(inner, found),
        _ => {}
    }
}
