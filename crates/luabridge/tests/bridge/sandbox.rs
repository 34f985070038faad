use luabridge::{BridgeError, HostValue, OperationRef, OverloadRole};
use pretty_assertions::assert_eq;

use crate::util::{builder, check, eval_err, eval_int, evaluator, evaluator_from};

const SPIN: &str = "while true do end";

#[test]
fn runaway_loop_is_stopped() {
    let ev = evaluator_from(builder().cycle_limit(50_000));
    let err = eval_err(&ev, SPIN);
    assert!(matches!(err, BridgeError::CycleLimitExceeded { max_cycles: 50_000 }));
    assert_eq!(err.to_string(), "cycle limit exceeded (max 50000)");
}

#[test]
fn pcall_cannot_swallow_the_limit() {
    let ev = evaluator_from(builder().cycle_limit(50_000));
    let err = eval_err(
        &ev,
        "for _ = 1, 10 do pcall(function() while true do end end) end
         return 'escaped'",
    );
    assert!(err.is_cycle_limit());
}

#[test]
fn budget_spans_the_evaluator_lifetime() {
    let ev = evaluator_from(builder().cycle_limit(50_000));
    let mut runs = 0;
    while ev.evaluate("for i = 1, 100 do end").is_ok() {
        runs += 1;
        assert!(runs < 50_000, "budget never ran out");
    }
    assert!(runs > 0);
    assert!(ev.cycles_used() > 50_000);
    assert!(eval_err(&ev, "return 1").is_cycle_limit());
}

#[test]
fn coroutines_are_counted() {
    let ev = evaluator_from(builder().cycle_limit(10_000));
    let err = eval_err(&ev, "coroutine.wrap(function() while true do end end)()");
    assert!(err.is_cycle_limit());

    let ev = evaluator_from(builder().cycle_limit(10_000));
    let err = eval_err(
        &ev,
        "local co = coroutine.create(function() for i = 1, 5000000 do end return 1 end)
         return select(2, coroutine.resume(co))",
    );
    assert!(err.is_cycle_limit());
    assert!(ev.cycles_used() > 10_000);
}

#[test]
fn limit_reached_inside_host_callback() {
    let ev = evaluator_from(builder().cycle_limit(50_000));
    let err = eval_err(&ev, "Counter.new().apply(function(x) while true do end end)");
    assert!(matches!(err, BridgeError::CycleLimitExceeded { max_cycles: 50_000 }));
}

#[test]
fn non_positive_limit_disables_counting() {
    let ev = evaluator_from(builder().cycle_limit(-1));
    assert_eq!(eval_int(&ev, "local n = 0 for i = 1, 100000 do n = n + 1 end return n"), 100_000);
    assert_eq!(ev.cycles_used(), 0);
}

#[test]
fn blocked_operations_disappear() {
    let ev = evaluator_from(
        builder()
            .block_operation(OperationRef::new("Counter", "inc", vec![]))
            .block_constructor(OperationRef::constructor("Money", vec![luabridge::Kind::LONG])),
    );
    check(&ev, "Counter.new().inc == nil and Counter.new().get ~= nil");
    let err = eval_err(&ev, "Money.new(1)");
    assert!(matches!(
        err,
        BridgeError::NoMatchingOverload { role: OverloadRole::Constructor, ref name, arg_count: 1 }
            if name == "new"
    ));
    assert_eq!(err.to_string(), "no constructor `new` accepts 1 argument(s)");
}

#[test]
fn standard_library_removal() {
    let ev = evaluator();
    check(&ev, "debug == nil");
    ev.remove_io().unwrap();
    ev.remove_os().unwrap();
    ev.remove_package().unwrap();
    ev.remove_coroutine().unwrap();
    check(&ev, "io == nil and os == nil and require == nil and coroutine == nil");
    check(&ev, "Host ~= nil and string ~= nil and math ~= nil");

    ev.remove_host_bridge().unwrap();
    check(&ev, "Host == nil");
    assert_eq!(eval_int(&ev, "Counter.new(2).get()"), 2);
}

#[test]
fn globals_can_be_cleared() {
    let ev = evaluator();
    ev.set_global("x", HostValue::Int(1)).unwrap();
    ev.set_global("x", HostValue::Null).unwrap();
    check(&ev, "x == nil");
    ev.remove_global("Counter").unwrap();
    check(&ev, "Counter == nil");
}
