//! Host-side data model for the luabridge value bridge.
//!
//! This crate provides:
//! - Host values (`HostValue`, `HostObject`, `HostArray`)
//! - Static kinds of host slots (`Kind`, `Prim`)
//! - Published type descriptors (`TypeDescriptor`, `Operation`, `Field`)
//! - The symbolic type registry (`TypeRegistry`)
//! - Host operation faults (`HostFault`)
//!
//! # Descriptors instead of reflection
//!
//! Host types describe themselves explicitly. A descriptor lists every
//! constructor, operation and field with its kinds, in declaration order, and
//! is registered by name once at startup. Opaque objects only carry their
//! type name; the registry maps it back to the descriptor.

mod array;
mod descriptor;
mod fault;
mod kind;
mod registry;
mod value;

pub use array::{ArrayData, HostArray};
pub use descriptor::{
    Field, FieldGetter, FieldSetter, Operation, OperationFn, OperationRef, Receiver,
    TypeBuilder, TypeDescriptor, TypeFlavor, CONSTRUCTOR_NAME, UNIVERSAL_OPERATIONS,
};
pub use fault::HostFault;
pub use kind::{Kind, Prim};
pub use registry::TypeRegistry;
pub use value::{ContractObject, HostInstance, HostObject, HostValue};
