//! Member handle queries
//!
//! These operate on member handles, not names, so they bypass dispatch:
//! no access checks and no const latching.

use crate::object::{Member, ParamType};
use crate::value::{Function, Value};
use crate::vm::Vm;

/// Public member
pub fn is_public(member: &Member) -> bool {
    member.flags().is_public()
}

/// Private member
pub fn is_private(member: &Member) -> bool {
    member.flags().is_private()
}

/// Static member
pub fn is_static(member: &Member) -> bool {
    member.flags().is_static()
}

/// Const field
pub fn is_const(member: &Member) -> bool {
    member.flags().is_const()
}

/// Abstract method
pub fn is_abstract(member: &Member) -> bool {
    member.flags().is_abstract()
}

/// Constructor
pub fn is_constructor(member: &Member) -> bool {
    member.flags().is_constructor()
}

/// Metamethod
pub fn is_meta(member: &Member) -> bool {
    member.flags().is_meta()
}

/// Field whose callable initializer is stored as-is
pub fn is_no_wrap(member: &Member) -> bool {
    member.flags().is_no_wrap()
}

/// Method, constructor, metamethod or abstract method
pub fn is_method(member: &Member) -> bool {
    member.flags().is_method()
}

/// Field
pub fn is_field(member: &Member) -> bool {
    member.flags().is_field()
}

/// Name of a member handle or of a registered class or object
///
/// `None` for anonymous classes, their objects and every other value.
pub fn get_name<'v>(vm: &Vm, value: &'v Value) -> Option<&'v str> {
    match value {
        Value::Member(member) => Some(member.name()),
        other => vm.registry().lookup(other)?.name(),
    }
}

/// Body of a concrete method; `None` for abstract methods and fields
pub fn get_method_function(member: &Member) -> Option<Function> {
    member.as_method()?.function()
}

/// Raw slot value of a field
pub fn get_field_value(member: &Member) -> Option<Value> {
    member.as_field().map(|field| field.get())
}

/// Overwrite a field's raw slot. Returns `false` for methods.
pub fn set_field_value(member: &Member, value: Value) -> bool {
    match member.as_field() {
        Some(field) => {
            field.set_raw(value);
            true
        }
        None => false,
    }
}

/// Parameter descriptors of a method; empty for abstract methods and fields
pub fn get_method_arg_types(member: &Member) -> Vec<ParamType> {
    match member.as_method() {
        Some(method) if !method.flags().is_abstract() => method.params().clone(),
        _ => Vec::new(),
    }
}

/// Replace a concrete method's body in place
///
/// Every class and object sharing the method sees the new body on its next
/// call. Returns `false`, changing nothing, for abstract methods and fields.
pub fn hotfix_method(member: &Member, function: Function) -> bool {
    match member.as_method() {
        Some(method) if !method.flags().is_abstract() => {
            tracing::debug!(method = method.name(), replacement = function.name(), "hot-swapped method");
            method.replace_function(function);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{AccessFlags, ParamKind};

    fn constant(v: i64) -> Function {
        Function::new("constant", move |_, _| Ok(Value::from(v)))
    }

    #[test]
    fn test_hotfix_reaches_existing_objects() {
        let mut vm = Vm::new();
        let class = vm.define_class(Some("C"), None).unwrap();
        let method = vm
            .define_method(&class, "value", Some(constant(1)), AccessFlags::PUBLIC, 0)
            .unwrap();
        let obj = Value::Record(vm.instantiate(&class, &[]).unwrap());
        assert_eq!(vm.call_method(&obj, "value", &[]).unwrap(), Value::from(1));

        assert!(hotfix_method(&Member::Method(method), constant(2)));
        assert_eq!(vm.call_method(&obj, "value", &[]).unwrap(), Value::from(2));
    }

    #[test]
    fn test_abstract_members_are_opaque() {
        let mut vm = Vm::new();
        let class = vm.define_class(Some("Shape"), None).unwrap();
        let area = vm
            .define_method(&class, "area", None, AccessFlags::PUBLIC | AccessFlags::ABSTRACT, 1)
            .unwrap();
        let member = Member::Method(area.clone());

        assert!(is_abstract(&member) && is_method(&member) && !is_field(&member));
        assert!(get_method_function(&member).is_none());
        assert!(get_method_arg_types(&member).is_empty());
        assert!(!hotfix_method(&member, constant(0)));
        assert!(area.function().is_none());
    }

    #[test]
    fn test_field_slots_bypass_const() {
        let mut vm = Vm::new();
        let class = vm.define_class(Some("C"), None).unwrap();
        let field = vm
            .define_field(&class, "k", Some(Value::from(1)), AccessFlags::PRIVATE | AccessFlags::CONST | AccessFlags::STATIC)
            .unwrap();
        let member = Member::Field(field);

        assert!(is_private(&member) && is_const(&member) && is_static(&member));
        assert!(is_field(&member) && !is_method(&member) && !is_no_wrap(&member));
        assert_eq!(get_name(&vm, &Value::Member(member.clone())), Some("k"));
        assert!(set_field_value(&member, Value::from(5)));
        assert_eq!(get_field_value(&member), Some(Value::from(5)));
        assert!(!hotfix_method(&member, constant(0)));
    }

    #[test]
    fn test_no_wrap_flag() {
        let mut vm = Vm::new();
        let class = vm.define_class(Some("C"), None).unwrap();
        let field = vm
            .define_field(&class, "cb", Some(Value::Function(constant(1))), AccessFlags::PUBLIC | AccessFlags::NOWRAP)
            .unwrap();
        let member = Member::Field(field);
        assert!(is_no_wrap(&member) && is_field(&member) && is_public(&member));
    }

    #[test]
    fn test_name_of_records() {
        let mut vm = Vm::new();
        let named = vm.define_class(Some("Named"), None).unwrap();
        let anonymous = vm.define_class(None, None).unwrap();
        let obj = Value::Record(vm.instantiate(&named, &[]).unwrap());

        assert_eq!(get_name(&vm, &Value::Record(named.clone())), Some("Named"));
        assert_eq!(get_name(&vm, &obj), Some("Named"));
        assert_eq!(get_name(&vm, &Value::Record(anonymous)), None);
        assert_eq!(get_name(&vm, &Value::from("Named")), None);
        assert_eq!(get_name(&vm, &Value::Nil), None);
    }

    #[test]
    fn test_arg_types_in_slot_order() {
        let mut vm = Vm::new();
        let class = vm.define_class(Some("C"), None).unwrap();
        let method = vm
            .define_method(&class, "f", Some(constant(0)), AccessFlags::PUBLIC, 2)
            .unwrap();
        vm.define_method_param_type(&method, 0, ParamKind::TypeName, Some(&Value::from("string")))
            .unwrap();
        vm.define_method_param_type(&method, 1, ParamKind::Vararg, None)
            .unwrap();

        let kinds: Vec<_> = get_method_arg_types(&Member::Method(method))
            .iter()
            .map(ParamType::kind)
            .collect();
        assert_eq!(kinds, [ParamKind::TypeName, ParamKind::Vararg]);
    }
}
