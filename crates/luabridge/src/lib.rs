//! Bidirectional value bridge between embedded Lua scripts and host types.
//!
//! This crate provides:
//! - Coercion between Lua values and host values (`convert`)
//! - Overload and constructor resolution under that coercion (`resolve`)
//! - Object wrappers: Lua userdata proxies for host values
//! - Contract adapters: host contracts implemented by Lua functions
//! - An instruction budget for untrusted scripts (`limiter`)
//! - The embedding facade, [`Evaluator`]
//!
//! # Example
//!
//! ```no_run
//! use luabridge::{Evaluator, HostValue, TypeRegistry};
//!
//! let evaluator = Evaluator::builder(TypeRegistry::new())
//!     .cycle_limit(100_000)
//!     .build()?;
//! evaluator.set_global("answer", HostValue::Int(42))?;
//! let value = evaluator.evaluate_host("answer + 1")?;
//! assert_eq!(value, HostValue::Int(43));
//! # Ok::<(), luabridge::BridgeError>(())
//! ```
//!
//! Host types are described up front with
//! [`TypeDescriptor`](luabridge_host::TypeDescriptor) and registered in a
//! [`TypeRegistry`](luabridge_host::TypeRegistry); scripts reach them through
//! globals or `Host.type("Name")`.

mod bridge;
mod config;
mod contract;
pub mod convert;
mod errors;
mod evaluator;
mod hooks;
mod host_lib;
pub mod limiter;
pub mod resolve;
mod wrapper;

#[cfg(test)]
mod test_support;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use contract::{implement, implement_function, ContractAdapter};
pub use convert::{to_host, to_script};
pub use errors::{BridgeError, BridgeResult};
pub use evaluator::{Evaluator, EvaluatorBuilder};
pub use hooks::{ConversionHook, ConversionHooks};
pub use host_lib::HOST_TABLE;
pub use limiter::CycleBudget;
pub use resolve::{OverloadRole, Resolved};
pub use wrapper::{MemberGroup, MemberTable, ObjectWrapper};

// Host data model, so embedders need a single dependency.
pub use luabridge_host::{
    ArrayData, ContractObject, Field, HostArray, HostFault, HostInstance, HostObject, HostValue,
    Kind, Operation, OperationRef, Prim, Receiver, TypeDescriptor, TypeFlavor, TypeRegistry,
};
