//! Host types shared by the unit tests.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use luabridge_host::{
    Field, HostFault, HostInstance, HostValue, Kind, Operation, TypeDescriptor, TypeRegistry,
};
use mlua::Lua;

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::hooks::ConversionHooks;

/// Mutable 2D point with value equality.
#[derive(Debug)]
pub(crate) struct Point {
    pub x: Cell<i32>,
    pub y: Cell<i32>,
}

impl HostInstance for Point {
    fn type_name(&self) -> &str {
        "Point"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn host_eq(&self, other: &dyn HostInstance) -> bool {
        other
            .as_any()
            .downcast_ref::<Point>()
            .is_some_and(|p| p.x == self.x && p.y == self.y)
    }

    fn host_hash(&self) -> u64 {
        (u64::from(self.x.get().unsigned_abs()) << 32) | u64::from(self.y.get().unsigned_abs())
    }

    fn describe(&self) -> Option<String> {
        Some(format!("Point({}, {})", self.x.get(), self.y.get()))
    }
}

pub(crate) fn point(x: i32, y: i32) -> HostValue {
    HostValue::object(Point {
        x: Cell::new(x),
        y: Cell::new(y),
    })
}

fn this_point(this: &HostValue) -> Result<&Point, HostFault> {
    this.as_object()
        .and_then(|o| o.downcast_ref::<Point>())
        .ok_or_else(|| HostFault::new(format!("not a point: {}", this.kind_name())))
}

pub(crate) fn int_arg(args: &[HostValue], index: usize) -> Result<i32, HostFault> {
    match args.get(index) {
        Some(HostValue::Int(v)) => Ok(*v),
        other => Err(HostFault::new(format!("expected int, got {other:?}"))),
    }
}

/// `Point`: two constructors, overloaded `scale`, a variadic `sum`,
/// a mutating `move_by` that returns the receiver, and fields.
pub(crate) fn point_type() -> Rc<TypeDescriptor> {
    TypeDescriptor::class("Point")
        .constructor(Operation::constructor(vec![]).body(|_, _| Ok(point(0, 0))))
        .constructor(
            Operation::constructor(vec![Kind::INT, Kind::INT])
                .body(|_, args| Ok(point(int_arg(&args, 0)?, int_arg(&args, 1)?))),
        )
        .operation(
            Operation::instance("x", vec![])
                .returns(Kind::INT)
                .body(|this, _| Ok(HostValue::Int(this_point(this)?.x.get()))),
        )
        .operation(
            Operation::instance("move_by", vec![Kind::INT, Kind::INT])
                .returns(Kind::object("Point"))
                .body(|this, args| {
                    let p = this_point(this)?;
                    p.x.set(p.x.get() + int_arg(&args, 0)?);
                    p.y.set(p.y.get() + int_arg(&args, 1)?);
                    Ok(this.clone())
                }),
        )
        .operation(
            Operation::instance("scale", vec![Kind::INT])
                .returns(Kind::Str)
                .body(|_, _| Ok(HostValue::from("int"))),
        )
        .operation(
            Operation::instance("scale", vec![Kind::Str])
                .returns(Kind::Str)
                .body(|_, _| Ok(HostValue::from("string"))),
        )
        .operation(
            Operation::instance("sum", vec![Kind::INT, Kind::array(Kind::INT)])
                .variadic()
                .returns(Kind::LONG)
                .body(|_, args| {
                    let base = i64::from(int_arg(&args, 0)?);
                    let rest: i64 = args
                        .get(1)
                        .and_then(HostValue::as_array)
                        .map(|a| a.to_values().iter().filter_map(HostValue::as_i64).sum())
                        .unwrap_or_default();
                    Ok(HostValue::Long(base + rest))
                }),
        )
        .operation(
            Operation::instance("fail", vec![])
                .body(|_, _| Err(HostFault::new("point is broken"))),
        )
        .operation(Operation::instance("secret", vec![]).hidden())
        .operation(
            Operation::static_fn("origin", vec![])
                .returns(Kind::object("Point"))
                .body(|_, _| Ok(point(0, 0))),
        )
        .field(
            Field::new("px", Kind::INT, |this| {
                Ok(HostValue::Int(this_point(this)?.x.get()))
            })
            .with_setter(|this, value| {
                this_point(this)?.x.set(int_arg(&[value], 0)?);
                Ok(())
            }),
        )
        .field(Field::new("py", Kind::INT, |this| {
            Ok(HostValue::Int(this_point(this)?.y.get()))
        }))
        .field(Field::static_field("DIMENSIONS", Kind::INT, |_| {
            Ok(HostValue::Int(2))
        }))
        .build()
}

/// Functional contract `IntOp { apply(int) -> int }`.
pub(crate) fn int_op_type() -> Rc<TypeDescriptor> {
    TypeDescriptor::functional_contract("IntOp")
        .operation(Operation::abstract_op("apply", vec![Kind::INT], Kind::INT))
        .build()
}

/// Contract `Greeter { greet(string) -> string; farewell() -> string }`
/// where `farewell` has a default body.
pub(crate) fn greeter_type() -> Rc<TypeDescriptor> {
    TypeDescriptor::contract("Greeter")
        .operation(Operation::abstract_op("greet", vec![Kind::Str], Kind::Str))
        .operation(
            Operation::abstract_op("farewell", vec![], Kind::Str)
                .body(|_, _| Ok(HostValue::from("bye"))),
        )
        .build()
}

pub(crate) fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(point_type())
        .with(int_op_type())
        .with(greeter_type())
}

pub(crate) fn bridge() -> Rc<Bridge> {
    Bridge::new(
        registry(),
        BridgeConfig::default(),
        ConversionHooks::default(),
    )
}

/// A bridge and a fresh Lua state with `Host` installed.
pub(crate) fn setup() -> (Rc<Bridge>, Lua) {
    let bridge = bridge();
    let lua = Lua::new();
    if let Err(err) = crate::host_lib::install(&lua, &bridge) {
        panic!("failed to install Host table: {err}");
    }
    (bridge, lua)
}
