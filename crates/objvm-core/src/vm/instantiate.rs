//! Instantiation engine
//!
//! Calling a class builds the super-object first, then the object's own
//! field slots, registers the object and finally runs the selected
//! constructor against it. Nothing is registered until every field is built.

use super::resolve::ResolveMode;
use super::{has_access, Vm};
use crate::object::{Record, RecordRef};
use crate::stack::Frame;
use crate::value::Value;
use crate::{VmError, VmResult};

impl Vm {
    /// Call `class` with `args`, as the innermost frame would
    pub fn instantiate(&mut self, class: &RecordRef, args: &[Value]) -> VmResult<RecordRef> {
        let caller = self.caller();
        self.instantiate_with(class, args, caller.as_ref())
    }

    pub(crate) fn instantiate_with(
        &mut self,
        class: &RecordRef,
        args: &[Value],
        caller: Option<&RecordRef>,
    ) -> VmResult<RecordRef> {
        if !class.is_class() {
            return Err(VmError::NotAClass {
                target: class.to_string(),
                operation: "only class can call constructors",
            });
        }

        // Super chains recurse through here; the guard frame bounds them.
        self.stack.push(Frame::plain(class.display_name().into()))?;
        let result = self.construct(class, args, caller);
        self.stack.pop();
        result
    }

    fn construct(
        &mut self,
        class: &RecordRef,
        args: &[Value],
        caller: Option<&RecordRef>,
    ) -> VmResult<RecordRef> {
        if class.constructors().is_empty() {
            return self.make_object(class, args);
        }

        let constructor = self
            .resolve(class, ResolveMode::Constructor, "", args, false)
            .ok_or_else(|| VmError::ConstructorNotFound {
                class: class.display_name().to_string(),
            })?;
        if constructor.flags().is_private() && !has_access(caller, class) {
            return Err(VmError::ConstructorAccessDenied {
                class: class.display_name().to_string(),
            });
        }

        let object = self.make_object(class, args)?;
        if let Some(function) = constructor.function() {
            self.invoke(&function, Some(object.clone()), args)?;
        }
        Ok(object)
    }

    fn make_object(&mut self, class: &RecordRef, args: &[Value]) -> VmResult<RecordRef> {
        let super_object = match class.super_record() {
            Some(super_class) => Some(self.instantiate_with(super_class, args, None)?),
            None => None,
        };
        let object = Record::new_object(class, super_object);

        for field in class.fields().iter() {
            let flags = field.flags();
            if flags.is_static() {
                object.push_field(field.clone());
                continue;
            }
            let value = match field.get() {
                Value::Function(init) if !flags.is_no_wrap() => {
                    self.invoke(&init, Some(object.clone()), &[])?
                }
                other => other,
            };
            object.push_field(field.instantiate(&object, value));
        }

        self.registry.register(&object);
        self.track_finalizer(&object, class);
        tracing::debug!(object = %object, class = %class, "constructed object");
        Ok(object)
    }
}
