use luabridge::{HostArray, HostValue, Kind};
use pretty_assertions::assert_eq;

use crate::util::{check, counter, eval_int, eval_str, evaluator};

fn with_array(values: Vec<i32>) -> (luabridge::Evaluator, HostArray) {
    let ev = evaluator();
    let array = HostArray::from(values);
    ev.set_global("arr", HostValue::Array(array.clone())).unwrap();
    (ev, array)
}

#[test]
fn int_array_scenario() {
    let (ev, array) = with_array(vec![1, 2, 3]);
    check(&ev, "arr[1] == 1");

    ev.evaluate("arr[4] = 4").unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(array.get(3), None);
    check(&ev, "arr.length == 3 and #arr == 3");

    check(
        &ev,
        "local c = arr.clone()
         return c ~= arr and c.length == 3 and c[1] == 1 and c[2] == 2 and c[3] == 3",
    );
}

#[test]
fn script_writes_are_visible_to_host() {
    let (ev, array) = with_array(vec![1, 2, 3]);
    ev.evaluate("arr[1] = 10; arr[3] = arr[3] * 2").unwrap();
    assert_eq!(
        array.to_values(),
        vec![HostValue::Int(10), HostValue::Int(2), HostValue::Int(6)]
    );
}

#[test]
fn host_writes_are_visible_to_script() {
    let (ev, array) = with_array(vec![0]);
    array.set(0, HostValue::Int(42)).unwrap();
    assert_eq!(eval_int(&ev, "arr[1]"), 42);
}

#[test]
fn clone_does_not_share_storage() {
    let (ev, array) = with_array(vec![1, 2, 3]);
    ev.evaluate("copy = arr.clone(); copy[1] = 100").unwrap();
    assert_eq!(array.get(0), Some(HostValue::Int(1)));
    assert_eq!(eval_int(&ev, "copy[1]"), 100);
}

#[test]
fn iterating_with_length() {
    let (ev, _) = with_array(vec![4, 5, 6]);
    let total = eval_int(
        &ev,
        "local total = 0
         for i = 1, arr.length do total = total + arr[i] end
         return total",
    );
    assert_eq!(total, 15);
}

#[test]
fn reference_arrays_hold_wrappers_and_nil() {
    let ev = evaluator();
    let items = HostArray::of(Kind::object("Counter"), vec![counter(7), HostValue::Null]);
    ev.set_global("items", HostValue::Array(items.clone())).unwrap();
    assert_eq!(eval_int(&ev, "items[1].get()"), 7);
    check(&ev, "items[2] == nil");

    ev.evaluate("items[2] = Counter.new(3); items[1] = nil").unwrap();
    assert_eq!(items.get(0), Some(HostValue::Null));
    assert_eq!(eval_int(&ev, "items[2].get()"), 3);
}

#[test]
fn string_arrays() {
    let ev = evaluator();
    let names = HostArray::of(Kind::Str, vec![HostValue::from("a"), HostValue::from("b")]);
    ev.set_global("names", HostValue::Array(names)).unwrap();
    assert_eq!(eval_str(&ev, "names[1] .. names[2]"), "ab");
}

#[test]
fn mismatched_element_write_fails_without_change() {
    let (ev, array) = with_array(vec![1]);
    let err = ev.evaluate("arr[1] = {}").unwrap_err();
    assert_eq!(err.to_string(), "TypeError: int expected, got table");
    assert_eq!(array.get(0), Some(HostValue::Int(1)));
}

#[test]
fn variadic_host_calls() {
    let ev = evaluator();
    assert_eq!(eval_int(&ev, "Counter.new().add(1, 2, 3).get()"), 6);
    assert_eq!(eval_int(&ev, "Counter.new().add({4, 5}).get()"), 9);
    assert_eq!(eval_int(&ev, "Counter.new(1).add().get()"), 1);
}
