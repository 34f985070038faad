//! Bridge configuration frozen at evaluator construction.

use luabridge_host::{Operation, OperationRef};
use rustc_hash::FxHashSet;

/// Immutable per-evaluator configuration.
///
/// Built by [`EvaluatorBuilder`](crate::EvaluatorBuilder); never mutated
/// once the evaluator exists.
#[derive(Clone, Debug, Default)]
pub struct BridgeConfig {
    cycle_limit: i64,
    blocked_operations: FxHashSet<OperationRef>,
    blocked_constructors: FxHashSet<OperationRef>,
}

impl BridgeConfig {
    pub(crate) fn new(
        cycle_limit: i64,
        blocked_operations: FxHashSet<OperationRef>,
        blocked_constructors: FxHashSet<OperationRef>,
    ) -> Self {
        BridgeConfig {
            cycle_limit,
            blocked_operations,
            blocked_constructors,
        }
    }

    /// Maximum instruction count; non-positive disables the limiter.
    pub fn cycle_limit(&self) -> i64 {
        self.cycle_limit
    }

    pub fn is_blocked(&self, op: &Operation) -> bool {
        let signature = op.signature();
        if op.is_constructor() {
            self.blocked_constructors.contains(&signature)
        } else {
            self.blocked_operations.contains(&signature)
        }
    }

    /// Whether `op` may appear in a script-visible dispatch table.
    pub fn exposes(&self, op: &Operation) -> bool {
        !op.is_hidden() && !self.is_blocked(op)
    }
}
