//! Observers notified whenever a host value is wrapped for script code.

use std::fmt;
use std::rc::Rc;

use luabridge_host::HostValue;

use crate::errors::BridgeResult;
use crate::wrapper::ObjectWrapper;

/// Observer of wrapper creation.
///
/// Returning an error aborts the wrap; the error propagates to whatever
/// triggered the conversion.
pub trait ConversionHook {
    fn on_wrap(&self, wrapper: &ObjectWrapper, value: &HostValue) -> BridgeResult<()>;
}

impl<F> ConversionHook for F
where
    F: Fn(&ObjectWrapper, &HostValue) -> BridgeResult<()>,
{
    fn on_wrap(&self, wrapper: &ObjectWrapper, value: &HostValue) -> BridgeResult<()> {
        self(wrapper, value)
    }
}

/// Ordered hook list of one evaluator.
#[derive(Clone, Default)]
pub struct ConversionHooks {
    hooks: Vec<Rc<dyn ConversionHook>>,
}

impl ConversionHooks {
    pub fn push(&mut self, hook: Rc<dyn ConversionHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Notify every hook in registration order, stopping at the first error.
    pub fn notify(&self, wrapper: &ObjectWrapper, value: &HostValue) -> BridgeResult<()> {
        self.hooks
            .iter()
            .try_for_each(|hook| hook.on_wrap(wrapper, value))
    }
}

impl fmt::Debug for ConversionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionHooks")
            .field("len", &self.hooks.len())
            .finish()
    }
}
