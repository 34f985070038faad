//! Registry of host type descriptors, keyed by type name.
//!
//! This is the resolution context for symbolic type names: `Host.type(name)`,
//! `Kind::Object(name)` / `Kind::Contract(name)` assignability checks, and the
//! runtime descriptor of an opaque object are all answered here.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::descriptor::TypeDescriptor;
use crate::value::HostValue;

/// Explicit name → descriptor registry, populated at startup.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<String, Rc<TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: Rc<TypeDescriptor>) -> Option<Rc<TypeDescriptor>> {
        tracing::debug!(name = descriptor.name(), "registering host type");
        self.types.insert(descriptor.name().to_string(), descriptor)
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, descriptor: Rc<TypeDescriptor>) -> Self {
        self.register(descriptor);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&Rc<TypeDescriptor>> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Runtime descriptor of a value: the registered type of an object, or
    /// the contract of an adapter. Other values have none.
    pub fn descriptor_of(&self, value: &HostValue) -> Option<Rc<TypeDescriptor>> {
        match value {
            HostValue::Object(object) => self.lookup(object.type_name()).cloned(),
            HostValue::Adapter(adapter) => Some(Rc::clone(adapter.contract())),
            _ => None,
        }
    }

    /// Whether type `from` is assignable to `to`, following declared
    /// supertypes transitively through the registry.
    pub fn is_assignable(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut seen = FxHashSet::default();
        let mut pending = vec![from];
        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            let Some(descriptor) = self.lookup(name) else {
                continue;
            };
            for parent in descriptor.supertypes() {
                if parent == to {
                    return true;
                }
                pending.push(parent.as_str());
            }
        }
        false
    }

    /// Whether `value` is an object or adapter whose type is assignable to `to`.
    pub fn is_instance(&self, value: &HostValue, to: &str) -> bool {
        match value {
            HostValue::Object(object) => self.is_assignable(object.type_name(), to),
            HostValue::Adapter(adapter) => self.is_assignable(adapter.contract().name(), to),
            _ => false,
        }
    }
}
