//! Shared program fixture for integration tests

use yxir::middle::ir::{ClassKind, IrArena, IrBuilder, Modality, NodeId};

/// Declarations of interest in [`program`]
#[allow(dead_code)]
pub struct Program {
    pub arena: IrArena,
    pub main: NodeId,
    pub api: NodeId,
    pub unused: NodeId,
    pub circle_area: NodeId,
    pub square_area: NodeId,
}

/// A small two-package program
///
/// ```text
/// package runtime
///   open class Any { open fun toString() }
///   fun stringGetLiteral(); fun getVirtualMethodId(); fun boxIntrinsic()
///
/// package app
///   interface Shape { fun area() }
///   class Circle : Shape { constructor(); override fun area(); fun debug() }
///   class Square : Shape { constructor(); override fun area() }
///   val cache = 0
///   export fun api()
///   fun unused()
///   fun main() { Circle(); 0.area(); "n = " + 1 }
/// ```
pub fn program() -> Program {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);

    let runtime_module = b.module("runtime").unwrap();
    let runtime = b.file(runtime_module, "runtime", "runtime.yx").unwrap();
    let any = b
        .class_with(runtime, "Any", ClassKind::Class, Modality::Open, &[])
        .unwrap();
    b.override_function(any, "toString", &[]).unwrap();
    b.function(runtime, "stringGetLiteral").unwrap();
    b.function(runtime, "getVirtualMethodId").unwrap();
    b.function(runtime, "boxIntrinsic").unwrap();

    let module = b.module("app").unwrap();
    let file = b.file(module, "app", "main.yx").unwrap();
    let shape = b
        .class_with(file, "Shape", ClassKind::Interface, Modality::Abstract, &[])
        .unwrap();
    let area = b.override_function(shape, "area", &[]).unwrap();

    let circle = b
        .class_with(file, "Circle", ClassKind::Class, Modality::Final, &[shape])
        .unwrap();
    let circle_ctor = b.constructor(circle).unwrap();
    let circle_area = b.override_function(circle, "area", &[area]).unwrap();
    b.function(circle, "debug").unwrap();

    let square = b
        .class_with(file, "Square", ClassKind::Class, Modality::Final, &[shape])
        .unwrap();
    b.constructor(square).unwrap();
    let square_area = b.override_function(square, "area", &[area]).unwrap();

    let zero = b.const_int(0).unwrap();
    b.field(file, "cache", Some(zero)).unwrap();
    let api = b.function(file, "api").unwrap();
    b.export(api).unwrap();
    let unused = b.function(file, "unused").unwrap();

    let main = b.function(file, "main").unwrap();
    let construct = b.constructor_call(circle_ctor, Vec::new()).unwrap();
    let receiver = b.const_int(0).unwrap();
    let call = b.virtual_call(area, receiver, Vec::new()).unwrap();
    let text = b.const_string("n = ").unwrap();
    let one = b.const_int(1).unwrap();
    let concat = b.string_concatenation(vec![text, one]).unwrap();
    for statement in [construct, call, concat] {
        b.add_statement(main, statement).unwrap();
    }

    Program {
        arena,
        main,
        api,
        unused,
        circle_area,
        square_area,
    }
}
