//! Identity registry lifecycle tests

use objvm_core::reflect;
use objvm_core::{AccessFlags, Value, Vm, VmOptions};

#[test]
fn test_unreachable_records_drop_out() {
    let mut vm = Vm::new();
    let class = vm.define_class(Some("Temp"), None).unwrap();
    let obj = Value::Record(vm.instantiate(&class, &[]).unwrap());
    let stale = obj.clone();
    assert!(reflect::is_object(&vm, &stale));
    assert_eq!(vm.registry().live_count(), 2);

    drop(obj);
    // Still reachable through `stale`
    assert!(vm.is_registered(&stale));
    drop(stale);
    drop(class);

    assert_eq!(vm.registry().live_count(), 0);
    assert_eq!(vm.collect_garbage(), 2);
    assert!(vm.registry().is_empty());
}

#[test]
fn test_objects_keep_their_class_alive() {
    let mut vm = Vm::new();
    let class = vm.define_class(Some("Kept"), None).unwrap();
    vm.define_field(&class, "x", Some(Value::from(1)), AccessFlags::PUBLIC)
        .unwrap();
    let obj = vm.instantiate(&class, &[]).unwrap();
    drop(class);

    vm.collect_garbage();
    let class = reflect::get_class(&vm, &Value::Record(obj.clone())).unwrap();
    assert!(vm.is_registered(&Value::Record(class)));
    assert_eq!(vm.index(&Value::Record(obj), "x").unwrap(), Value::from(1));
}

#[test]
fn test_purge_threshold_bounds_dead_entries() {
    let mut vm = Vm::with_options(VmOptions::with_purge_threshold(8));
    let class = vm.define_class(Some("Churn"), None).unwrap();
    for _ in 0..100 {
        let obj = vm.instantiate(&class, &[]).unwrap();
        drop(obj);
        assert!(vm.registry().len() <= 8);
    }
    assert_eq!(vm.registry().live_count(), 1);
}

#[test]
fn test_threshold_grows_with_live_population() {
    let mut vm = Vm::with_options(VmOptions::with_purge_threshold(4));
    let class = vm.define_class(Some("Kept"), None).unwrap();
    let kept: Vec<_> = (0..10).map(|_| vm.instantiate(&class, &[]).unwrap()).collect();

    assert_eq!(vm.registry().len(), 11);
    assert!(vm.registry().threshold() >= 8);
    assert_eq!(kept.len(), 10);
}

#[test]
fn test_gc_metamethod_runs_once_unreachable() {
    use std::cell::Cell;
    use std::rc::Rc;

    use objvm_core::vm::FINALIZER;
    use objvm_core::Function;

    let finalized = Rc::new(Cell::new(0));
    let mut vm = Vm::new();
    let class = vm.define_class(Some("Resource"), None).unwrap();
    vm.define_field(&class, "id", Some(Value::from(7)), AccessFlags::PUBLIC)
        .unwrap();
    let seen = finalized.clone();
    let gc = Function::new("__gc", move |vm, _| {
        let (this, _) = vm.method_init();
        assert_eq!(vm.index(&this, "id")?, Value::from(7));
        seen.set(seen.get() + 1);
        Ok(Value::Nil)
    });
    vm.define_method(&class, FINALIZER, Some(gc), AccessFlags::PUBLIC | AccessFlags::META, 0)
        .unwrap();

    let obj = vm.instantiate(&class, &[]).unwrap();
    let handle = Value::Record(obj.clone());
    drop(obj);

    // Still referenced by `handle`
    vm.collect_garbage();
    assert_eq!(finalized.get(), 0);
    assert_eq!(vm.pending_finalizers(), 1);

    drop(handle);
    vm.collect_garbage();
    assert_eq!(finalized.get(), 1);
    assert_eq!(vm.pending_finalizers(), 0);
    assert_eq!(vm.registry().live_count(), 1);

    vm.collect_garbage();
    assert_eq!(finalized.get(), 1);
}
