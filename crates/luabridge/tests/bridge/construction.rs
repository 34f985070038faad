use luabridge::{BridgeError, OverloadRole};
use pretty_assertions::assert_eq;

use crate::util::{check, eval_err, eval_int, eval_str, evaluator};

#[test]
fn constructor_picked_by_arguments() {
    let ev = evaluator();
    assert_eq!(eval_int(&ev, "Counter.new(5).get()"), 5);
    assert_eq!(eval_int(&ev, "Counter.new().get()"), 0);

    let err = eval_err(&ev, "Counter.new('x')");
    assert!(matches!(
        err,
        BridgeError::TypeMismatch { ref expected, ref actual } if expected == "int" && actual == "string"
    ));
}

#[test]
fn symbolic_type_lookup() {
    let ev = evaluator();
    assert_eq!(eval_int(&ev, "Host.type('Counter').new(2).get()"), 2);
    check(&ev, "Host.type('Counter') == Counter");

    let err = eval_err(&ev, "Host.type('Missing')");
    assert!(matches!(err, BridgeError::UnknownSymbolicType { ref name } if name == "Missing"));
}

#[test]
fn missing_arguments_are_default_filled() {
    let ev = evaluator();
    // The only constructor takes a long; with no arguments it gets zero.
    assert_eq!(eval_int(&ev, "Money.new().amount()"), 0);
}

#[test]
fn methods_returning_receiver_chain_on_same_wrapper() {
    let ev = evaluator();
    check(&ev, "local c = Counter.new(); return rawequal(c.inc(), c)");
    assert_eq!(eval_int(&ev, "Counter.new().inc().inc().inc().get()"), 3);
}

#[test]
fn statics_and_type_meta_members() {
    let ev = evaluator();
    assert_eq!(eval_int(&ev, "Counter.zero().get()"), 0);
    assert_eq!(eval_str(&ev, "Counter.name()"), "Counter");
    check(&ev, "Counter.is_instance(Counter.new())");
    check(&ev, "not Counter.is_instance(Money.new(1))");
    check(&ev, "not Counter.is_instance('Counter')");
}

#[test]
fn overloads_by_kind() {
    let ev = evaluator();
    assert_eq!(eval_int(&ev, "local c = Counter.new(); c.set(8); return c.get()"), 8);
    assert_eq!(eval_int(&ev, "local c = Counter.new(); c.set(true); return c.get()"), 1);

    let err = eval_err(&ev, "Counter.new().set('x')");
    assert!(matches!(
        err,
        BridgeError::NoMatchingOverload { role: OverloadRole::Method, ref name, arg_count: 1 } if name == "set"
    ));
}

#[test]
fn fields() {
    let ev = evaluator();
    assert_eq!(eval_int(&ev, "local c = Counter.new(4); return c.value"), 4);
    assert_eq!(eval_int(&ev, "local c = Counter.new(); c.value = 9; return c.get()"), 9);

    let err = eval_err(&ev, "Counter.new().value = 'nine'");
    assert!(matches!(err, BridgeError::TypeMismatch { .. }));
}

#[test]
fn unknown_members_are_nil_and_assignable() {
    let ev = evaluator();
    check(&ev, "Counter.new().nothing == nil");
    assert_eq!(eval_int(&ev, "local c = Counter.new(); c.extra = 12; return c.extra"), 12);
    check(&ev, "local c = Counter.new(); c.extra = 12; return Counter.new().extra == nil");
}

#[test]
fn member_errors_are_catchable() {
    let ev = evaluator();
    check(
        &ev,
        "local ok, err = pcall(function() return Counter.new('x') end)
         return not ok and tostring(err):find('int expected', 1, true) ~= nil",
    );
}
