//! Embedding facade: one Lua state bridged to one host type registry.

use std::rc::Rc;

use luabridge_host::{HostValue, Kind, OperationRef, TypeRegistry};
use mlua::{Lua, Value};
use rustc_hash::FxHashSet;

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::convert;
use crate::errors::BridgeResult;
use crate::hooks::{ConversionHook, ConversionHooks};
use crate::host_lib::{self, HOST_TABLE};
use crate::limiter::{self, CycleBudget};

/// Chunk name reported in script error messages.
const CHUNK_NAME: &str = "=script";

/// Builder for [`Evaluator`].
///
/// Everything set here is frozen into the evaluator's [`BridgeConfig`].
pub struct EvaluatorBuilder {
    registry: TypeRegistry,
    cycle_limit: i64,
    blocked_operations: FxHashSet<OperationRef>,
    blocked_constructors: FxHashSet<OperationRef>,
    hooks: ConversionHooks,
}

impl EvaluatorBuilder {
    fn new(registry: TypeRegistry) -> Self {
        EvaluatorBuilder {
            registry,
            cycle_limit: 0,
            blocked_operations: FxHashSet::default(),
            blocked_constructors: FxHashSet::default(),
            hooks: ConversionHooks::default(),
        }
    }

    /// Maximum VM instructions per evaluator lifetime. Non-positive means
    /// unlimited.
    #[must_use]
    pub fn cycle_limit(mut self, max_cycles: i64) -> Self {
        self.cycle_limit = max_cycles;
        self
    }

    /// Hide an operation from script code.
    #[must_use]
    pub fn block_operation(mut self, signature: OperationRef) -> Self {
        self.blocked_operations.insert(signature);
        self
    }

    /// Hide a constructor from script code.
    #[must_use]
    pub fn block_constructor(mut self, signature: OperationRef) -> Self {
        self.blocked_constructors.insert(signature);
        self
    }

    #[must_use]
    pub fn conversion_hook(mut self, hook: impl ConversionHook + 'static) -> Self {
        self.hooks.push(Rc::new(hook));
        self
    }

    pub fn build(self) -> BridgeResult<Evaluator> {
        let config = BridgeConfig::new(
            self.cycle_limit,
            self.blocked_operations,
            self.blocked_constructors,
        );
        let budget = Rc::new(CycleBudget::new(config.cycle_limit()));
        let bridge = Bridge::new(self.registry, config, self.hooks);

        let lua = Lua::new();
        lua.globals().raw_set("debug", Value::Nil)?;
        host_lib::install(&lua, &bridge)?;
        limiter::install(&lua, &budget)?;

        tracing::debug!(
            types = bridge.registry().len(),
            cycle_limit = budget.max_cycles(),
            "evaluator ready"
        );
        Ok(Evaluator { lua, bridge, budget })
    }
}

/// A sandboxed Lua state whose scripts can use registered host types.
///
/// Single-threaded: neither `Send` nor `Sync`.
pub struct Evaluator {
    lua: Lua,
    bridge: Rc<Bridge>,
    budget: Rc<CycleBudget>,
}

impl Evaluator {
    pub fn builder(registry: TypeRegistry) -> EvaluatorBuilder {
        EvaluatorBuilder::new(registry)
    }

    /// Evaluator with default configuration: no cycle limit, nothing blocked.
    pub fn new(registry: TypeRegistry) -> BridgeResult<Self> {
        Self::builder(registry).build()
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn bridge(&self) -> &Rc<Bridge> {
        &self.bridge
    }

    /// Bind a host value to a global. Scalars are stored directly, `Null`
    /// removes the global, anything else is wrapped.
    pub fn set_global(&self, name: &str, value: HostValue) -> BridgeResult<()> {
        if value.is_null() {
            return self.remove_global(name);
        }
        let script = convert::to_script(&self.bridge, &self.lua, value)?;
        self.lua.globals().set(name, script)?;
        Ok(())
    }

    /// Bind a host value to a global, always through an object wrapper.
    pub fn set_object(&self, name: &str, value: HostValue) -> BridgeResult<()> {
        if value.is_null() {
            return self.remove_global(name);
        }
        let wrapper = self.bridge.wrap(&self.lua, value)?;
        self.lua.globals().set(name, wrapper)?;
        Ok(())
    }

    /// Bind a raw script value to a global.
    pub fn set_script_global(&self, name: &str, value: Value) -> BridgeResult<()> {
        self.lua.globals().set(name, value)?;
        Ok(())
    }

    pub fn remove_global(&self, name: &str) -> BridgeResult<()> {
        self.lua.globals().raw_set(name, Value::Nil)?;
        Ok(())
    }

    pub fn add_conversion_hook(&self, hook: impl ConversionHook + 'static) {
        self.bridge.add_hook(Rc::new(hook));
    }

    /// Run `source` and return its result.
    ///
    /// An expression is evaluated as such; a statement chunk yields its
    /// `return` value, or nil.
    #[tracing::instrument(level = "debug", skip(self, source), fields(len = source.len()))]
    pub fn evaluate(&self, source: &str) -> BridgeResult<Value> {
        let result = self.lua.load(source).set_name(CHUNK_NAME).eval::<Value>();
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                let err = crate::BridgeError::from(err);
                tracing::debug!(error = %err, "evaluation failed");
                Err(err)
            }
        }
    }

    /// Run `source` and coerce its result to a host value.
    pub fn evaluate_host(&self, source: &str) -> BridgeResult<HostValue> {
        let value = self.evaluate(source)?;
        self.to_host(&value, &Kind::Any)
    }

    pub fn to_host(&self, value: &Value, kind: &Kind) -> BridgeResult<HostValue> {
        convert::to_host(&self.bridge, &self.lua, value, kind)
    }

    pub fn to_script(&self, value: HostValue) -> BridgeResult<Value> {
        convert::to_script(&self.bridge, &self.lua, value)
    }

    /// Remove `package` and `require`.
    pub fn remove_package(&self) -> BridgeResult<()> {
        self.remove_global("package")?;
        self.remove_global("require")
    }

    pub fn remove_io(&self) -> BridgeResult<()> {
        self.remove_global("io")
    }

    pub fn remove_os(&self) -> BridgeResult<()> {
        self.remove_global("os")
    }

    pub fn remove_coroutine(&self) -> BridgeResult<()> {
        self.remove_global("coroutine")
    }

    /// Remove the `Host` table.
    pub fn remove_host_bridge(&self) -> BridgeResult<()> {
        self.remove_global(HOST_TABLE)
    }

    /// Instructions counted so far; zero when no limit is configured.
    pub fn cycles_used(&self) -> i64 {
        self.budget.used()
    }
}
