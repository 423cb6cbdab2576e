//! Class introspection
//!
//! Every query takes a script value and answers "no" (or `None`) for values
//! that are not registered classes or objects.

use crate::object::{Member, RecordRef};
use crate::value::Value;
use crate::vm::Vm;

/// Member list to enumerate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Fields
    Fields,
    /// Constructors
    Constructors,
    /// Regular methods
    Methods,
    /// Metamethods
    Metamethods,
    /// Abstract methods
    AbstractMethods,
}

/// How far up the super chain enumeration goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberScope {
    /// Only members the record itself holds
    Declared,
    /// The record's members followed by every ancestor's, nearest first
    Inherited,
}

/// Super class of a class, super-object of an object
pub fn get_super(vm: &Vm, value: &Value) -> Option<RecordRef> {
    vm.registry().lookup(value)?.super_record().cloned()
}

/// Class holder of a record: itself for a class, its class for an object
pub fn get_class(vm: &Vm, value: &Value) -> Option<RecordRef> {
    vm.registry().lookup(value).map(|record| record.class_holder())
}

/// Whether `value` is a registered class
pub fn is_class(vm: &Vm, value: &Value) -> bool {
    vm.registry().lookup(value).is_some_and(|record| record.is_class())
}

/// Whether `value` is a registered object
pub fn is_object(vm: &Vm, value: &Value) -> bool {
    vm.registry().lookup(value).is_some_and(|record| !record.is_class())
}

fn list(record: &RecordRef, kind: MemberKind) -> Vec<Member> {
    match kind {
        MemberKind::Fields => record.fields().iter().cloned().map(Member::Field).collect(),
        MemberKind::Constructors => record.constructors().iter().cloned().map(Member::Method).collect(),
        MemberKind::Methods => record.methods().iter().cloned().map(Member::Method).collect(),
        MemberKind::Metamethods => record.metamethods().iter().cloned().map(Member::Method).collect(),
        MemberKind::AbstractMethods => {
            record.abstract_methods().iter().cloned().map(Member::Method).collect()
        }
    }
}

/// Enumerate members of a registered class or object
///
/// Returns `None` when `value` is not registered.
pub fn members(vm: &Vm, value: &Value, kind: MemberKind, scope: MemberScope) -> Option<Vec<Member>> {
    let record = vm.registry().lookup(value)?;
    let out = match scope {
        MemberScope::Declared => list(record, kind),
        MemberScope::Inherited => record.chain().flat_map(|r| list(&r, kind)).collect(),
    };
    Some(out)
}

/// Both are registered records of the same nominal type
pub fn type_of(vm: &Vm, a: &Value, b: &Value) -> bool {
    match (vm.registry().lookup(a), vm.registry().lookup(b)) {
        (Some(a), Some(b)) => a.holder_id() == b.holder_id(),
        _ => false,
    }
}

/// `a` is a registered record whose chain contains `b`'s nominal type
pub fn instance_of(vm: &Vm, a: &Value, b: &Value) -> bool {
    match (vm.registry().lookup(a), b.as_record()) {
        (Some(a), Some(b)) => a.descends_from(b),
        _ => false,
    }
}

/// `self` and `super` of the running member call
pub fn get_method_init(vm: &Vm) -> (Value, Value) {
    vm.method_init()
}
