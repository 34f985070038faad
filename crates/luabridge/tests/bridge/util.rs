//! Host types registered by every test evaluator.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use luabridge::{
    BridgeError, Evaluator, EvaluatorBuilder, Field, HostFault, HostInstance, HostValue, Kind,
    Operation, TypeDescriptor, TypeRegistry,
};
use mlua::Value;

/// Mutable counter with reference identity.
#[derive(Debug)]
pub struct Counter {
    pub value: Cell<i64>,
}

impl HostInstance for Counter {
    fn type_name(&self) -> &str {
        "Counter"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> Option<String> {
        Some(format!("Counter({})", self.value.get()))
    }
}

/// Immutable amount with value equality.
#[derive(Debug)]
pub struct Money(pub i64);

impl HostInstance for Money {
    fn type_name(&self) -> &str {
        "Money"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn host_eq(&self, other: &dyn HostInstance) -> bool {
        other
            .as_any()
            .downcast_ref::<Money>()
            .is_some_and(|m| m.0 == self.0)
    }

    fn host_hash(&self) -> u64 {
        self.0.unsigned_abs()
    }

    fn describe(&self) -> Option<String> {
        Some(format!("${}", self.0))
    }
}

pub fn counter(value: i64) -> HostValue {
    HostValue::object(Counter {
        value: Cell::new(value),
    })
}

pub fn money(amount: i64) -> HostValue {
    HostValue::object(Money(amount))
}

fn counter_of(this: &HostValue) -> Result<&Counter, HostFault> {
    this.as_object()
        .and_then(|o| o.downcast_ref::<Counter>())
        .ok_or_else(|| HostFault::new(format!("not a counter: {}", this.kind_name())))
}

fn long_arg(args: &[HostValue], index: usize) -> Result<i64, HostFault> {
    args.get(index)
        .and_then(HostValue::as_i64)
        .ok_or_else(|| HostFault::new(format!("argument {index} is not an integer")))
}

fn arg(args: &[HostValue], index: usize) -> HostValue {
    args.get(index).cloned().unwrap_or(HostValue::Null)
}

pub fn counter_type() -> Rc<TypeDescriptor> {
    TypeDescriptor::class("Counter")
        .constructor(Operation::constructor(vec![]).body(|_, _| Ok(counter(0))))
        .constructor(
            Operation::constructor(vec![Kind::INT])
                .body(|_, args| Ok(counter(long_arg(&args, 0)?))),
        )
        .operation(
            Operation::instance("get", vec![])
                .returns(Kind::LONG)
                .body(|this, _| Ok(HostValue::Long(counter_of(this)?.value.get()))),
        )
        .operation(
            Operation::instance("inc", vec![])
                .returns(Kind::object("Counter"))
                .body(|this, _| {
                    let c = counter_of(this)?;
                    c.value.set(c.value.get() + 1);
                    Ok(this.clone())
                }),
        )
        .operation(
            Operation::instance("add", vec![Kind::array(Kind::LONG)])
                .variadic()
                .returns(Kind::object("Counter"))
                .body(|this, args| {
                    let c = counter_of(this)?;
                    let total: i64 = arg(&args, 0)
                        .as_array()
                        .map(|a| a.to_values().iter().filter_map(HostValue::as_i64).sum())
                        .unwrap_or_default();
                    c.value.set(c.value.get() + total);
                    Ok(this.clone())
                }),
        )
        .operation(
            Operation::instance("set", vec![Kind::LONG])
                .body(|this, args| {
                    counter_of(this)?.value.set(long_arg(&args, 0)?);
                    Ok(HostValue::Null)
                }),
        )
        .operation(
            Operation::instance("set", vec![Kind::BOOL])
                .body(|this, args| {
                    let on = matches!(arg(&args, 0), HostValue::Bool(true));
                    counter_of(this)?.value.set(i64::from(on));
                    Ok(HostValue::Null)
                }),
        )
        .operation(
            Operation::instance("apply", vec![Kind::contract("IntOp")])
                .returns(Kind::LONG)
                .body(|this, args| {
                    let c = counter_of(this)?;
                    let input = i32::try_from(c.value.get()).map_err(HostFault::from_error)?;
                    let output = arg(&args, 0).call_contract("apply", vec![HostValue::Int(input)])?;
                    let value = output
                        .as_i64()
                        .ok_or_else(|| HostFault::new("apply returned a non-integer"))?;
                    c.value.set(value);
                    Ok(HostValue::Long(value))
                }),
        )
        .operation(
            Operation::instance("greet", vec![Kind::contract("Greeter"), Kind::Str])
                .returns(Kind::Str)
                .body(|_, args| {
                    let greeter = arg(&args, 0);
                    let hello = greeter.call_contract("greet", vec![arg(&args, 1)])?;
                    let bye = greeter.call_contract("farewell", vec![])?;
                    Ok(HostValue::string(format!("{hello}; {bye}")))
                }),
        )
        .operation(
            Operation::static_fn("zero", vec![])
                .returns(Kind::object("Counter"))
                .body(|_, _| Ok(counter(0))),
        )
        .field(
            Field::new("value", Kind::LONG, |this| {
                Ok(HostValue::Long(counter_of(this)?.value.get()))
            })
            .with_setter(|this, value| {
                counter_of(this)?.value.set(long_arg(&[value], 0)?);
                Ok(())
            }),
        )
        .build()
}

pub fn money_type() -> Rc<TypeDescriptor> {
    TypeDescriptor::class("Money")
        .constructor(
            Operation::constructor(vec![Kind::LONG])
                .body(|_, args| Ok(money(long_arg(&args, 0)?))),
        )
        .operation(
            Operation::instance("amount", vec![])
                .returns(Kind::LONG)
                .body(|this, _| {
                    this.as_object()
                        .and_then(|o| o.downcast_ref::<Money>())
                        .map(|m| HostValue::Long(m.0))
                        .ok_or_else(|| HostFault::new("not money"))
                }),
        )
        .build()
}

pub fn int_op_type() -> Rc<TypeDescriptor> {
    TypeDescriptor::functional_contract("IntOp")
        .operation(Operation::abstract_op("apply", vec![Kind::INT], Kind::INT))
        .build()
}

pub fn greeter_type() -> Rc<TypeDescriptor> {
    TypeDescriptor::contract("Greeter")
        .operation(Operation::abstract_op("greet", vec![Kind::Str], Kind::Str))
        .operation(
            Operation::abstract_op("farewell", vec![], Kind::Str)
                .body(|_, _| Ok(HostValue::from("bye"))),
        )
        .build()
}

pub fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(counter_type())
        .with(money_type())
        .with(int_op_type())
        .with(greeter_type())
}

pub fn builder() -> EvaluatorBuilder {
    Evaluator::builder(registry())
}

/// Evaluator with `Counter` and `Money` bound as globals.
pub fn evaluator_from(builder: EvaluatorBuilder) -> Evaluator {
    let ev = builder.build().unwrap();
    for name in ["Counter", "Money"] {
        let descriptor = ev.bridge().lookup_type(name).unwrap();
        ev.set_global(name, HostValue::Type(descriptor)).unwrap();
    }
    ev
}

pub fn evaluator() -> Evaluator {
    evaluator_from(builder())
}

pub fn eval_int(ev: &Evaluator, source: &str) -> i64 {
    match ev.evaluate(source).unwrap() {
        Value::Integer(i) => i,
        other => panic!("expected an integer from `{source}`, got {other:?}"),
    }
}

pub fn eval_str(ev: &Evaluator, source: &str) -> String {
    match ev.evaluate_host(source).unwrap() {
        HostValue::Str(s) => s,
        other => panic!("expected a string from `{source}`, got {other:?}"),
    }
}

/// Evaluate a condition that must hold.
pub fn check(ev: &Evaluator, source: &str) {
    match ev.evaluate(source).unwrap() {
        Value::Boolean(true) => {}
        other => panic!("`{source}` evaluated to {other:?}"),
    }
}

pub fn eval_err(ev: &Evaluator, source: &str) -> BridgeError {
    ev.evaluate(source).unwrap_err()
}
