//! Member dispatch tables.
//!
//! A wrapper's dispatch table maps a member name to its ordered overload
//! candidates. It is built once, on first member access, from the wrapped
//! value's descriptor and filtered through the bridge configuration.

use std::rc::Rc;

use luabridge_host::{HostFault, HostValue, Kind, Operation, TypeDescriptor, CONSTRUCTOR_NAME};
use rustc_hash::FxHashMap;

use crate::bridge::Bridge;
use crate::resolve::OverloadRole;

/// Overload candidates published under one member name.
#[derive(Clone, Debug)]
pub struct MemberGroup {
    pub role: OverloadRole,
    pub name: String,
    pub candidates: Rc<[Operation]>,
}

/// Name → candidates, each list in declaration order.
#[derive(Debug, Default)]
pub struct MemberTable {
    groups: FxHashMap<String, MemberGroup>,
}

impl MemberTable {
    pub fn get(&self, name: &str) -> Option<&MemberGroup> {
        self.groups.get(name)
    }

    /// Build the table for a wrapped value.
    pub fn build(bridge: &Rc<Bridge>, target: &HostValue) -> Self {
        let mut groups = GroupBuilder::default();
        match target {
            HostValue::Array(array) => {
                groups.push(OverloadRole::Method, array_clone(&array.element_kind()));
            }
            HostValue::Type(descriptor) => groups.add_type_members(bridge, descriptor),
            HostValue::Object(_) | HostValue::Adapter(_) => {
                match bridge.registry().descriptor_of(target) {
                    Some(descriptor) => groups.add_instance_members(bridge, &descriptor),
                    None => tracing::debug!(
                        kind = %target.kind_name(),
                        "no registered descriptor, wrapper has no members"
                    ),
                }
            }
            _ => {}
        }
        let groups: FxHashMap<String, MemberGroup> = groups
            .groups
            .into_iter()
            .map(|(name, (role, candidates))| {
                let group = MemberGroup {
                    role,
                    name: name.clone(),
                    candidates: candidates.into(),
                };
                (name, group)
            })
            .collect();
        tracing::trace!(kind = %target.kind_name(), members = groups.len(), "built dispatch table");
        MemberTable { groups }
    }
}

#[derive(Default)]
struct GroupBuilder {
    groups: FxHashMap<String, (OverloadRole, Vec<Operation>)>,
}

impl GroupBuilder {
    fn push(&mut self, role: OverloadRole, op: Operation) {
        self.groups
            .entry(op.name().to_string())
            .or_insert_with(|| (role, Vec::new()))
            .1
            .push(op);
    }

    fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    fn add_instance_members(&mut self, bridge: &Bridge, descriptor: &TypeDescriptor) {
        let config = bridge.config();
        for op in descriptor.instance_operations() {
            if config.exposes(op) {
                self.push(OverloadRole::Method, op.clone());
            }
        }
    }

    fn add_type_members(&mut self, bridge: &Rc<Bridge>, descriptor: &TypeDescriptor) {
        let config = bridge.config();
        for ctor in descriptor.constructors() {
            if config.exposes(ctor) {
                self.push(OverloadRole::Constructor, ctor.clone());
            }
        }
        // `new` exists even with nothing to construct; calling it then fails
        // with `NoMatchingOverload`.
        self.groups
            .entry(CONSTRUCTOR_NAME.to_string())
            .or_insert_with(|| (OverloadRole::Constructor, Vec::new()));
        for op in descriptor.static_operations() {
            if op.name() != CONSTRUCTOR_NAME && config.exposes(op) {
                self.push(OverloadRole::Method, op.clone());
            }
        }
        if !self.contains("name") {
            self.push(OverloadRole::Method, type_name_op(descriptor.name()));
        }
        if !self.contains("is_instance") {
            self.push(
                OverloadRole::Method,
                is_instance_op(descriptor.name(), Rc::clone(bridge)),
            );
        }
    }
}

/// `array.clone()`: a new array of the same kind with copied contents.
fn array_clone(element: &Kind) -> Operation {
    let kind = Kind::array(element.clone());
    Operation::instance("clone", vec![])
        .owned_by(kind.to_string())
        .returns(kind)
        .body(|this, _| match this {
            HostValue::Array(array) => Ok(HostValue::Array(array.deep_copy())),
            other => Err(HostFault::new(format!(
                "clone called on {}",
                other.kind_name()
            ))),
        })
}

/// `Type.name()`: the registered type name.
fn type_name_op(owner: &str) -> Operation {
    let name = owner.to_string();
    Operation::static_fn("name", vec![])
        .owned_by(owner)
        .returns(Kind::Str)
        .body(move |_, _| Ok(HostValue::string(name.as_str())))
}

/// `Type.is_instance(value)`: assignability of the value's runtime type.
fn is_instance_op(owner: &str, bridge: Rc<Bridge>) -> Operation {
    let name = owner.to_string();
    Operation::static_fn("is_instance", vec![Kind::Any])
        .owned_by(owner)
        .returns(Kind::BOOL)
        .body(move |_, args| {
            let value = args.first().unwrap_or(&HostValue::Null);
            Ok(HostValue::Bool(bridge.registry().is_instance(value, &name)))
        })
}
