//! Dispatch engine
//!
//! Reads resolve fields to values and methods to call proxies; the overload
//! is only chosen when the proxy is called and the arguments are known.
//! Access is decided from the caller token: the receiver of the frame that
//! performs the read, write or call.

use std::rc::Rc;

use super::define::describe;
use super::resolve::{resolve_in, ResolveMode};
use super::{has_access, Vm};
use crate::object::{Method, RecordRef};
use crate::value::Value;
use crate::{VmError, VmResult};

/// What a call proxy invokes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyTarget {
    /// Methods named by the key
    Method(Rc<str>),
    /// Constructors of the searched record, run against the origin object
    Constructor,
}

/// A member reference bound to its receiver, resolved at call time
#[derive(Debug)]
pub struct CallProxy {
    origin: RecordRef,
    search_from: RecordRef,
    target: ProxyTarget,
}

impl CallProxy {
    /// Record the proxy was read from; the receiver of the eventual call
    pub fn origin(&self) -> &RecordRef {
        &self.origin
    }

    /// Record on the origin's chain where the member was found
    pub fn search_from(&self) -> &RecordRef {
        &self.search_from
    }

    /// What the proxy invokes
    pub fn target(&self) -> &ProxyTarget {
        &self.target
    }

    pub(crate) fn describe(&self) -> String {
        match &self.target {
            ProxyTarget::Method(name) => format!("{}.{}", self.origin.display_name(), name),
            ProxyTarget::Constructor => format!("{}.<init>", self.search_from.display_name()),
        }
    }
}

fn expect_record<'v>(value: &'v Value, key: &str) -> VmResult<&'v RecordRef> {
    value.as_record().ok_or_else(|| VmError::MemberNotFound {
        member: key.to_string(),
        target: describe(value),
    })
}

impl Vm {
    /// Read `key` from a class or object
    pub fn index(&mut self, target: &Value, key: &str) -> VmResult<Value> {
        let origin = expect_record(target, key)?;
        let caller = self.caller();
        self.index_from(origin, origin, key, caller.as_ref())
    }

    pub(crate) fn index_from(
        &self,
        origin: &RecordRef,
        search_from: &RecordRef,
        key: &str,
        caller: Option<&RecordRef>,
    ) -> VmResult<Value> {
        let access = has_access(caller, origin);
        let mut current = search_from.clone();
        loop {
            if let Some(field) = current.own_field(key) {
                if field.flags().is_private() && !access {
                    return Err(VmError::PrivateMemberDenied {
                        member: key.to_string(),
                        target: origin.to_string(),
                    });
                }
                if !field.flags().is_static() && origin.is_class() {
                    return Err(VmError::ObjectFieldAsStatic {
                        field: key.to_string(),
                        class: origin.display_name().to_string(),
                    });
                }
                return Ok(field.get());
            }

            let method = current.methods().iter().any(|m| {
                m.name() == key
                    && (access || !m.flags().is_private())
                    && (m.flags().is_static() || !origin.is_class())
            });
            if method {
                tracing::trace!(origin = %origin, key, found_in = %current, "method proxy");
                return Ok(Value::Proxy(Rc::new(CallProxy {
                    origin: origin.clone(),
                    search_from: current,
                    target: ProxyTarget::Method(key.into()),
                })));
            }

            if access && !origin.is_class() && current.name() == Some(key) {
                return Ok(Value::Proxy(Rc::new(CallProxy {
                    origin: origin.clone(),
                    search_from: current,
                    target: ProxyTarget::Constructor,
                })));
            }

            match current.super_record() {
                Some(next) => current = next.clone(),
                None => {
                    return Err(VmError::MemberNotFound {
                        member: key.to_string(),
                        target: origin.to_string(),
                    })
                }
            }
        }
    }

    /// Write `key` on a class or object. Only declared fields are assignable.
    pub fn set_index(&mut self, target: &Value, key: &str, value: Value) -> VmResult<()> {
        let origin = expect_record(target, key)?;
        let caller = self.caller();
        let access = has_access(caller.as_ref(), origin);

        for record in origin.chain() {
            let Some(field) = record.own_field(key) else {
                continue;
            };
            let flags = field.flags();
            if flags.is_const() && field.is_locked() {
                return Err(VmError::ConstFieldImmutable {
                    field: key.to_string(),
                });
            }
            if flags.is_private() && !access {
                return Err(VmError::PrivateMemberDenied {
                    member: key.to_string(),
                    target: origin.to_string(),
                });
            }
            if !flags.is_static() && origin.is_class() {
                return Err(VmError::ObjectFieldAsStatic {
                    field: key.to_string(),
                    class: origin.display_name().to_string(),
                });
            }
            field.set_raw(value);
            if flags.is_const() {
                field.lock();
            }
            return Ok(());
        }

        Err(VmError::FieldNotFound {
            field: key.to_string(),
            target: origin.to_string(),
        })
    }

    /// Read `name` and call the result
    pub fn call_method(&mut self, target: &Value, name: &str, args: &[Value]) -> VmResult<Value> {
        let callee = self.index(target, name)?;
        self.call(&callee, args)
    }

    pub(crate) fn call_proxy(
        &mut self,
        proxy: &CallProxy,
        args: &[Value],
        caller: Option<&RecordRef>,
    ) -> VmResult<Value> {
        let origin = &proxy.origin;
        let access = has_access(caller, origin);

        match &proxy.target {
            ProxyTarget::Method(name) => {
                let class_origin = origin.is_class();
                let method = resolve_in(
                    &self.registry,
                    &proxy.search_from,
                    ResolveMode::Method,
                    name,
                    args,
                    true,
                    &|m: &Method| m.flags().is_static() || !class_origin,
                )
                .ok_or_else(|| VmError::MemberNotFound {
                    member: name.to_string(),
                    target: origin.to_string(),
                })?;

                if method.flags().is_private() && !access {
                    return Err(VmError::PrivateMemberDenied {
                        member: name.to_string(),
                        target: origin.to_string(),
                    });
                }
                let function = method.function().ok_or_else(|| VmError::MemberNotFound {
                    member: name.to_string(),
                    target: origin.to_string(),
                })?;
                self.invoke(&function, Some(origin.clone()), args)
            }
            ProxyTarget::Constructor => {
                let class = &proxy.search_from;
                if origin.is_class() || !access {
                    return Err(VmError::ConstructorAccessDenied {
                        class: class.display_name().to_string(),
                    });
                }
                let constructor = self
                    .resolve(class, ResolveMode::Constructor, "", args, false)
                    .ok_or_else(|| VmError::ConstructorNotFound {
                        class: class.display_name().to_string(),
                    })?;
                match constructor.function() {
                    Some(function) => self.invoke(&function, Some(origin.clone()), args),
                    None => Ok(Value::Nil),
                }
            }
        }
    }

    /// Dispatch a metamethod on `target`, searching its super chain
    pub fn meta_call(&mut self, target: &RecordRef, name: &str, args: &[Value]) -> VmResult<Value> {
        let metamethod = self
            .resolve(target, ResolveMode::Metamethod, name, args, true)
            .ok_or_else(|| VmError::MetamethodNotFound {
                name: name.to_string(),
            })?;
        let function = metamethod
            .function()
            .ok_or_else(|| VmError::MetamethodNotFound {
                name: name.to_string(),
            })?;
        self.invoke(&function, Some(target.clone()), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::AccessFlags;
    use crate::value::Function;

    #[test]
    fn test_static_field_through_class() {
        let mut vm = Vm::new();
        let class = vm.define_class(Some("Counter"), None).unwrap();
        vm.define_field(&class, "count", Some(Value::from(0)), AccessFlags::PUBLIC | AccessFlags::STATIC)
            .unwrap();
        vm.define_field(&class, "x", Some(Value::from(1)), AccessFlags::PUBLIC)
            .unwrap();
        let class_value = Value::Record(class.clone());

        assert_eq!(vm.index(&class_value, "count").unwrap(), Value::from(0));
        assert!(matches!(
            vm.index(&class_value, "x"),
            Err(VmError::ObjectFieldAsStatic { .. })
        ));
        assert!(matches!(
            vm.set_index(&class_value, "x", Value::from(2)),
            Err(VmError::ObjectFieldAsStatic { .. })
        ));
    }

    #[test]
    fn test_instance_methods_hidden_from_class_reads() {
        let mut vm = Vm::new();
        let class = vm.define_class(Some("C"), None).unwrap();
        let f = Function::new("m", |_, _| Ok(Value::Nil));
        vm.define_method(&class, "m", Some(f), AccessFlags::PUBLIC, 0)
            .unwrap();
        assert!(matches!(
            vm.index(&Value::Record(class), "m"),
            Err(VmError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn test_index_on_non_record() {
        let mut vm = Vm::new();
        assert!(matches!(
            vm.index(&Value::from(1), "x"),
            Err(VmError::MemberNotFound { target, .. }) if target == "number"
        ));
    }

    #[test]
    fn test_proxy_remembers_where_member_was_found() {
        let mut vm = Vm::new();
        let base = vm.define_class(Some("Base"), None).unwrap();
        let f = Function::new("hello", |_, _| Ok(Value::from("hi")));
        vm.define_method(&base, "hello", Some(f), AccessFlags::PUBLIC, 0)
            .unwrap();
        let derived = vm
            .define_class(Some("Derived"), Some(&Value::Record(base)))
            .unwrap();
        let obj = vm.instantiate(&derived, &[]).unwrap();

        let proxy = vm.index(&Value::Record(obj.clone()), "hello").unwrap();
        let Value::Proxy(p) = &proxy else {
            panic!("expected proxy, got {proxy:?}");
        };
        assert!(Rc::ptr_eq(p.origin(), &obj));
        assert_eq!(p.search_from().name(), Some("Base"));
        assert!(!p.search_from().is_class());
        assert_eq!(vm.call(&proxy, &[]).unwrap(), Value::from("hi"));
    }
}
