//! Integration tests for executing compiled class bodies
//!
//! Each test assembles a chunk the way the compiler would emit it for a
//! class declaration, runs it, then drives the resulting class.

use objvm_bytecode::{param_kind, BytecodeWriter, ClassChunk, NO_INDEX, NO_REG};
use objvm_core::{AccessFlags, Function, Value, Vm, VmError};

const PUBLIC: u16 = AccessFlags::PUBLIC.bits();
const ABSTRACT: u16 = AccessFlags::PUBLIC.bits() | AccessFlags::ABSTRACT.bits();

/// class Shape { abstract area(); }
/// class Square extends Shape { side = 2; area() { ... } }
fn shapes(with_override: bool) -> ClassChunk {
    let mut chunk = ClassChunk::new("shapes", 6);
    let shape = chunk.constants.add_string("Shape");
    let square = chunk.constants.add_string("Square");
    let area = chunk.constants.add_string("area");
    let side = chunk.constants.add_string("side");
    let two = chunk.constants.add_int(2);

    let mut w = BytecodeWriter::new();
    w.emit_def_class(0, shape, NO_REG);
    w.emit_def_method(1, 0, area, NO_REG, ABSTRACT, 0);
    w.emit_check_abstract(0);

    w.emit_def_class(2, square, 0);
    w.emit_load_const(3, two);
    w.emit_def_field(2, side, 3, PUBLIC);
    if with_override {
        w.emit_load_function(4, 0);
        w.emit_def_method(5, 2, area, 4, PUBLIC, 0);
        w.emit_check_member_conflict(2, 5);
    }
    w.emit_check_abstract(2);
    w.emit_return(2);
    chunk.code = w.into_bytes();
    chunk
}

fn area() -> Function {
    Function::new("area", |vm, _| {
        let (this, _) = vm.method_init();
        let side = vm.index(&this, "side")?;
        let side = side
            .as_integer()
            .ok_or_else(|| VmError::RuntimeError("side is not an integer".into()))?;
        Ok(Value::from(side * side))
    })
}

#[test]
fn test_class_body_round_trip() {
    let mut vm = Vm::new();
    let square = vm.execute(&shapes(true), &[area()]).unwrap();
    let class = square.as_record().unwrap().clone();
    assert_eq!(class.name(), Some("Square"));
    assert_eq!(class.super_record().unwrap().name(), Some("Shape"));

    let obj = vm.call(&square, &[]).unwrap();
    assert_eq!(vm.call_method(&obj, "area", &[]).unwrap(), Value::from(4));
}

#[test]
fn test_missing_override_fails_at_class_close() {
    let mut vm = Vm::new();
    assert_eq!(
        vm.execute(&shapes(false), &[]),
        Err(VmError::AbstractNotImplemented {
            class: "Square".into(),
            method: "area".into(),
            declared_in: "Shape".into(),
        })
    );
}

#[test]
fn test_serialized_chunk_executes() {
    let mut vm = Vm::new();
    let bytes = shapes(true).encode();
    let square = vm.execute_bytes(&bytes, &[area()]).unwrap();
    assert!(vm.is_registered(&square));
}

#[test]
fn test_class_typed_parameter_from_register() {
    // class Pet {}  class Vet { treat(p: Pet) {} }
    let mut chunk = ClassChunk::new("vet", 4);
    let pet = chunk.constants.add_string("Pet");
    let vet = chunk.constants.add_string("Vet");
    let treat = chunk.constants.add_string("treat");

    let mut w = BytecodeWriter::new();
    w.emit_def_class(0, pet, NO_REG);
    w.emit_def_class(1, vet, NO_REG);
    w.emit_load_function(2, 0);
    w.emit_def_method(3, 1, treat, 2, PUBLIC, 1);
    w.emit_def_method_arg_type(3, 0, param_kind::CLASS, 0);
    w.emit_return(1);
    chunk.code = w.into_bytes();

    let mut vm = Vm::new();
    let treated = Function::new("treat", |_, _| Ok(Value::from("treated")));
    let vet = vm.execute(&chunk, &[treated]).unwrap();
    let pet = vet.as_record().unwrap().methods()[0].params()[0].class().unwrap();

    let doctor = vm.call(&vet, &[]).unwrap();
    let patient = vm.call(&Value::Record(pet), &[]).unwrap();
    assert_eq!(
        vm.call_method(&doctor, "treat", &[patient]).unwrap(),
        Value::from("treated")
    );
    assert!(matches!(
        vm.call_method(&doctor, "treat", &[Value::from("cat")]),
        Err(VmError::MemberNotFound { .. })
    ));
}

#[test]
fn test_anonymous_class_and_bad_super() {
    let mut chunk = ClassChunk::new("bad", 2);
    let mut w = BytecodeWriter::new();
    w.emit_load_nil(0);
    w.emit_def_class(1, NO_INDEX, 0);
    w.emit_def_class(0, NO_INDEX, 1);
    w.emit_def_class(1, NO_INDEX, 0);
    w.emit_return(1);
    chunk.code = w.into_bytes();

    let mut vm = Vm::new();
    let anonymous = vm.execute(&chunk, &[]).unwrap();
    assert_eq!(anonymous.as_record().unwrap().display_name(), "<anonymous>");

    let mut chunk = ClassChunk::new("bad", 2);
    let answer = chunk.constants.add_int(42);
    let mut w = BytecodeWriter::new();
    w.emit_load_const(0, answer);
    w.emit_def_class(1, NO_INDEX, 0);
    w.emit_return(1);
    chunk.code = w.into_bytes();
    assert!(matches!(
        vm.execute(&chunk, &[]),
        Err(VmError::BadSuperClass { found }) if found == "number"
    ));
}
