//! Execution budget for script code.
//!
//! The limiter counts VM instructions through an every-instruction hook. Once
//! the count passes the maximum, every further instruction raises
//! [`BridgeError::CycleLimitExceeded`](crate::BridgeError::CycleLimitExceeded).
//! The counter is never reset, so catching the fault in script code does not
//! buy more time: the next instruction raises it again.
//!
//! Hooks are per thread, so coroutines get their own hook on the same
//! budget: `coroutine.create` and `coroutine.wrap` are replaced with versions
//! that install it on every thread they create.

use std::cell::Cell;
use std::rc::Rc;

use mlua::{Function, HookTriggers, Lua, MultiValue, Table, Thread, VmState};

use crate::errors::{cycle_limit_exceeded, BridgeResult};

/// Monotonic instruction counter with a fixed maximum.
#[derive(Debug)]
pub struct CycleBudget {
    max_cycles: i64,
    used: Cell<i64>,
}

impl CycleBudget {
    pub fn new(max_cycles: i64) -> Self {
        CycleBudget {
            max_cycles,
            used: Cell::new(0),
        }
    }

    pub fn max_cycles(&self) -> i64 {
        self.max_cycles
    }

    /// Whether the budget counts at all.
    pub fn is_enabled(&self) -> bool {
        self.max_cycles > 0
    }

    pub fn used(&self) -> i64 {
        self.used.get()
    }

    /// Account for one instruction.
    ///
    /// The tick that takes the counter past the maximum, and every tick
    /// after it, fails carrying the maximum.
    pub fn tick(&self) -> BridgeResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let used = self.used.get().saturating_add(1);
        self.used.set(used);
        if used > self.max_cycles {
            if used == self.max_cycles.saturating_add(1) {
                tracing::warn!(max_cycles = self.max_cycles, "cycle limit exceeded");
            }
            return Err(cycle_limit_exceeded(self.max_cycles));
        }
        Ok(())
    }
}

/// Install `budget` on `lua` as an every-instruction hook, covering the main
/// thread and every coroutine scripts create.
///
/// Does nothing for a non-positive maximum.
pub fn install(lua: &Lua, budget: &Rc<CycleBudget>) -> BridgeResult<()> {
    if !budget.is_enabled() {
        return Ok(());
    }
    lua.set_hook(every_instruction(), counting_hook(Rc::clone(budget)));
    if let Some(coroutine) = lua.globals().get::<Option<Table>>("coroutine")? {
        hook_coroutines(lua, &coroutine, budget)?;
    }
    tracing::debug!(max_cycles = budget.max_cycles(), "cycle limiter installed");
    Ok(())
}

fn every_instruction() -> HookTriggers {
    HookTriggers::new().every_nth_instruction(1)
}

fn counting_hook(budget: Rc<CycleBudget>) -> impl Fn(&Lua, mlua::Debug) -> mlua::Result<VmState> {
    move |_, _| {
        budget.tick()?;
        Ok(VmState::Continue)
    }
}

/// Create a coroutine that charges its instructions to `budget`.
fn counted_thread(lua: &Lua, body: Function, budget: &Rc<CycleBudget>) -> mlua::Result<Thread> {
    let thread = lua.create_thread(body)?;
    thread.set_hook(every_instruction(), counting_hook(Rc::clone(budget)));
    Ok(thread)
}

fn hook_coroutines(lua: &Lua, coroutine: &Table, budget: &Rc<CycleBudget>) -> BridgeResult<()> {
    let create_budget = Rc::clone(budget);
    let create = lua.create_function(move |lua, body: Function| {
        counted_thread(lua, body, &create_budget)
    })?;
    coroutine.set("create", create)?;

    let wrap_budget = Rc::clone(budget);
    let wrap = lua.create_function(move |lua, body: Function| {
        let thread = counted_thread(lua, body, &wrap_budget)?;
        lua.create_function(move |_, args: MultiValue| thread.resume::<MultiValue>(args))
    })?;
    coroutine.set("wrap", wrap)?;
    Ok(())
}
