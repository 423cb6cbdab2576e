//! Build-time class checks
//!
//! Run by the compiled class body after its members are defined:
//! `CKMCONST` once per method, `CKCABSTRACT` once when the class closes.

use std::rc::Rc;

use super::define::require_class;
use super::Vm;
use crate::object::{Method, RecordRef};
use crate::{VmError, VmResult};

fn member_kind(method: &Method) -> &'static str {
    let flags = method.flags();
    if flags.is_constructor() {
        "constructor"
    } else if flags.is_meta() {
        "metamethod"
    } else if flags.is_abstract() {
        "abstract method"
    } else {
        "method"
    }
}

fn named(list: &[Rc<Method>], name: &str) -> bool {
    list.iter().any(|m| m.name() == name)
}

impl Vm {
    /// Reject a member that reuses the name of a different kind of inherited member
    pub fn check_member_conflict(&self, class: &RecordRef, method: &Method) -> VmResult<()> {
        require_class(class, "member conflict check needs a class")?;
        let name = method.name();
        let kind = member_kind(method);
        let flags = method.flags();

        for ancestor in class.ancestors() {
            let inherited = if flags.is_constructor() {
                if named(&ancestor.methods(), name) || named(&ancestor.abstract_methods(), name) {
                    Some("method")
                } else if named(&ancestor.metamethods(), name) {
                    Some("metamethod")
                } else {
                    None
                }
            } else if flags.is_meta() {
                if named(&ancestor.methods(), name) || named(&ancestor.abstract_methods(), name) {
                    Some("method")
                } else {
                    None
                }
            } else if ancestor.name() == Some(name) {
                Some("constructor")
            } else if named(&ancestor.metamethods(), name) {
                Some("metamethod")
            } else {
                None
            };

            if let Some(inherited) = inherited {
                return Err(VmError::MemberConflict {
                    class: class.display_name().to_string(),
                    member: name.to_string(),
                    kind,
                    inherited,
                });
            }
        }
        Ok(())
    }

    /// Require every inherited abstract method to have a concrete override
    /// in `class` or an intermediate ancestor
    pub fn check_abstract(&self, class: &RecordRef) -> VmResult<()> {
        require_class(class, "abstract check needs a class")?;

        for ancestor in class.ancestors() {
            for declared in ancestor.abstract_methods().iter() {
                let implemented = class
                    .chain()
                    .take_while(|record| !Rc::ptr_eq(record, &ancestor))
                    .any(|record| named(&record.methods(), declared.name()));
                if !implemented {
                    return Err(VmError::AbstractNotImplemented {
                        class: class.display_name().to_string(),
                        method: declared.name().to_string(),
                        declared_in: ancestor.display_name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
