//! Shared state of one evaluator's value bridge.
//!
//! Every Lua callback the bridge installs captures an `Rc<Bridge>`: the
//! type registry, the frozen configuration and the conversion hooks.

use std::cell::RefCell;
use std::rc::Rc;

use luabridge_host::{HostValue, TypeDescriptor, TypeRegistry};
use mlua::{AnyUserData, Lua};

use crate::config::BridgeConfig;
use crate::errors::{unknown_symbolic_type, BridgeResult};
use crate::hooks::{ConversionHook, ConversionHooks};
use crate::wrapper::ObjectWrapper;

#[derive(Debug)]
pub struct Bridge {
    registry: TypeRegistry,
    config: BridgeConfig,
    hooks: RefCell<ConversionHooks>,
}

impl Bridge {
    pub(crate) fn new(
        registry: TypeRegistry,
        config: BridgeConfig,
        hooks: ConversionHooks,
    ) -> Rc<Self> {
        Rc::new(Bridge {
            registry,
            config,
            hooks: RefCell::new(hooks),
        })
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub(crate) fn add_hook(&self, hook: Rc<dyn ConversionHook>) {
        self.hooks.borrow_mut().push(hook);
    }

    /// Resolve a symbolic type name.
    pub fn lookup_type(&self, name: &str) -> BridgeResult<Rc<TypeDescriptor>> {
        self.registry
            .lookup(name)
            .cloned()
            .ok_or_else(|| unknown_symbolic_type(name))
    }

    /// Wrap `value` in a fresh object wrapper userdata.
    ///
    /// Hooks run before the userdata exists; the first hook error aborts.
    pub(crate) fn wrap(self: &Rc<Self>, lua: &Lua, value: HostValue) -> BridgeResult<AnyUserData> {
        let wrapper = ObjectWrapper::new(Rc::clone(self), value);
        // Snapshot so a hook may register further hooks without a borrow conflict.
        let hooks = self.hooks.borrow().clone();
        hooks.notify(&wrapper, wrapper.target())?;
        tracing::trace!(kind = %wrapper.target().kind_name(), "wrapping host value");
        Ok(lua.create_userdata(wrapper)?)
    }
}
