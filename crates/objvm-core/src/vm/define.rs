//! Definition engine

use std::rc::Rc;

use super::Vm;
use crate::object::{AccessFlags, Field, Method, ParamKind, ParamType, Record, RecordRef};
use crate::value::{Function, Value};
use crate::{VmError, VmResult};

/// Metamethods the dispatch engine implements itself
pub const RESERVED_METAMETHODS: [&str; 3] = ["__index", "__newindex", "__call"];

pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Record(record) => record.to_string(),
        other => other.type_name().to_string(),
    }
}

pub(crate) fn require_class(class: &RecordRef, operation: &'static str) -> VmResult<()> {
    if class.is_class() {
        Ok(())
    } else {
        Err(VmError::NotAClass {
            target: class.to_string(),
            operation,
        })
    }
}

impl Vm {
    /// Define a class, optionally extending a registered class
    pub fn define_class(
        &mut self,
        name: Option<&str>,
        super_class: Option<&Value>,
    ) -> VmResult<RecordRef> {
        let super_class = match super_class {
            None | Some(Value::Nil) => None,
            Some(value) => match self.registry.lookup(value) {
                Some(record) if record.is_class() => Some(record.clone()),
                _ => {
                    return Err(VmError::BadSuperClass {
                        found: describe(value),
                    })
                }
            },
        };

        let class = Record::new_class(name.map(Rc::from), super_class);
        self.registry.register(&class);
        tracing::debug!(class = %class, super_class = ?class.super_record().map(|s| s.id()), "defined class");
        Ok(class)
    }

    /// Append a field to `class`
    ///
    /// A const field given an initializer is locked immediately, even when the
    /// initializer is nil.
    pub fn define_field(
        &mut self,
        class: &RecordRef,
        name: &str,
        init: Option<Value>,
        flags: AccessFlags,
    ) -> VmResult<Rc<Field>> {
        require_class(class, "cannot define fields on an object")?;
        let flags = flags.for_field().validated(name)?;

        if class.chain().any(|record| record.own_field(name).is_some()) {
            return Err(VmError::DuplicateField {
                field: name.to_string(),
                class: class.display_name().to_string(),
            });
        }

        let locked = init.is_some() && flags.is_const();
        let field = Rc::new(Field::new(name.into(), class, flags, init.unwrap_or_default()));
        if locked {
            field.lock();
        }
        class.push_field(field.clone());
        tracing::debug!(class = %class, field = name, flags = ?flags, "defined field");
        Ok(field)
    }

    /// Append a method to `class`, routed by its flags into constructors,
    /// metamethods, abstract methods or regular methods
    pub fn define_method(
        &mut self,
        class: &RecordRef,
        name: &str,
        function: Option<Function>,
        flags: AccessFlags,
        arity: usize,
    ) -> VmResult<Rc<Method>> {
        require_class(class, "cannot define methods on an object")?;
        let flags = flags.for_method().validated(name)?;

        if flags.is_meta() && RESERVED_METAMETHODS.contains(&name) {
            return Err(VmError::MetamethodReserved {
                name: name.to_string(),
            });
        }

        let function = if flags.is_abstract() {
            None
        } else {
            Some(function.ok_or_else(|| {
                VmError::InvalidOperand(format!("method '{name}' is not abstract but has no body"))
            })?)
        };

        let method = Rc::new(Method::new(name.into(), class, flags, function, arity));
        if flags.is_constructor() {
            class.push_constructor(method.clone());
        } else if flags.is_meta() {
            class.push_metamethod(method.clone());
        } else if flags.is_abstract() {
            class.push_abstract(method.clone());
        } else {
            class.push_method(method.clone());
        }
        tracing::debug!(class = %class, method = name, arity, flags = ?flags, "defined method");
        Ok(method)
    }

    /// Set the descriptor of one parameter slot
    ///
    /// Type-name operands must be strings; the wildcard type name becomes
    /// [`ParamType::Any`]. Class operands must be registered classes.
    pub fn define_method_param_type(
        &mut self,
        method: &Method,
        slot: usize,
        kind: ParamKind,
        operand: Option<&Value>,
    ) -> VmResult<()> {
        if slot >= method.arity() {
            return Err(VmError::BadParameterSlot {
                method: method.name().to_string(),
                slot,
                arity: method.arity(),
            });
        }

        let param = match kind {
            ParamKind::Any => ParamType::Any,
            ParamKind::Vararg => ParamType::Vararg,
            ParamKind::TypeName => match operand.and_then(Value::as_str) {
                Some(name) if name == self.options.any_type_name => ParamType::Any,
                Some(name) => ParamType::TypeName(name.into()),
                None => {
                    return Err(VmError::BadParameterType {
                        method: method.name().to_string(),
                        kind: kind as u8,
                    })
                }
            },
            ParamKind::Class => match operand.and_then(|v| self.registry.lookup(v)) {
                Some(class) if class.is_class() => ParamType::Class(Rc::downgrade(class)),
                _ => {
                    return Err(VmError::BadParameterClass {
                        method: method.name().to_string(),
                        slot,
                    })
                }
            },
        };

        tracing::trace!(method = method.name(), slot, param = ?param, "parameter type");
        method.set_param(slot, param);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Function {
        Function::new("noop", |_, _| Ok(Value::Nil))
    }

    #[test]
    fn test_super_must_be_registered_class() {
        let mut vm = Vm::new();
        let base = vm.define_class(Some("Base"), None).unwrap();
        assert!(vm.define_class(Some("D"), Some(&Value::Record(base.clone()))).is_ok());

        let stray = Record::new_class(Some("Stray".into()), None);
        assert!(matches!(
            vm.define_class(None, Some(&Value::Record(stray))),
            Err(VmError::BadSuperClass { .. })
        ));
        assert!(matches!(
            vm.define_class(None, Some(&Value::from(3))),
            Err(VmError::BadSuperClass { found }) if found == "number"
        ));

        let obj = vm.instantiate(&base, &[]).unwrap();
        assert!(matches!(
            vm.define_class(None, Some(&Value::Record(obj))),
            Err(VmError::BadSuperClass { .. })
        ));
    }

    #[test]
    fn test_methods_are_routed_by_flags() {
        let mut vm = Vm::new();
        let class = vm.define_class(Some("C"), None).unwrap();
        vm.define_method(&class, "C", Some(noop()), AccessFlags::PUBLIC | AccessFlags::CONSTRUCTOR, 0)
            .unwrap();
        vm.define_method(&class, "__add", Some(noop()), AccessFlags::META, 1)
            .unwrap();
        vm.define_method(&class, "area", None, AccessFlags::PUBLIC | AccessFlags::ABSTRACT, 0)
            .unwrap();
        vm.define_method(&class, "run", Some(noop()), AccessFlags::PRIVATE, 0)
            .unwrap();

        assert_eq!(class.constructors().len(), 1);
        assert_eq!(class.metamethods().len(), 1);
        assert_eq!(class.abstract_methods().len(), 1);
        assert_eq!(class.methods().len(), 1);
        assert!(class.abstract_methods()[0].function().is_none());
        assert!(class.metamethods()[0].flags().is_static());
    }

    #[test]
    fn test_reserved_metamethods() {
        let mut vm = Vm::new();
        let class = vm.define_class(None, None).unwrap();
        for name in RESERVED_METAMETHODS {
            assert!(matches!(
                vm.define_method(&class, name, Some(noop()), AccessFlags::META, 0),
                Err(VmError::MetamethodReserved { .. })
            ));
        }
    }

    #[test]
    fn test_concrete_method_needs_body() {
        let mut vm = Vm::new();
        let class = vm.define_class(None, None).unwrap();
        assert!(matches!(
            vm.define_method(&class, "f", None, AccessFlags::PUBLIC, 0),
            Err(VmError::InvalidOperand(_))
        ));
    }

    #[test]
    fn test_param_type_validation() {
        let mut vm = Vm::new();
        let class = vm.define_class(Some("P"), None).unwrap();
        let method = vm
            .define_method(&class, "f", Some(noop()), AccessFlags::PUBLIC, 2)
            .unwrap();

        vm.define_method_param_type(&method, 0, ParamKind::TypeName, Some(&Value::from("any")))
            .unwrap();
        assert_eq!(method.params()[0].kind(), ParamKind::Any);

        vm.define_method_param_type(&method, 1, ParamKind::Class, Some(&Value::Record(class.clone())))
            .unwrap();
        assert!(Rc::ptr_eq(&method.params()[1].class().unwrap(), &class));

        assert!(matches!(
            vm.define_method_param_type(&method, 2, ParamKind::Any, None),
            Err(VmError::BadParameterSlot { slot: 2, arity: 2, .. })
        ));
        assert!(matches!(
            vm.define_method_param_type(&method, 0, ParamKind::Class, Some(&Value::from("P"))),
            Err(VmError::BadParameterClass { slot: 0, .. })
        ));
        assert!(matches!(
            vm.define_method_param_type(&method, 0, ParamKind::TypeName, Some(&Value::from(1))),
            Err(VmError::BadParameterType { kind: 2, .. })
        ));
    }
}
