//! Overload resolver
//!
//! First match, not best match. Pass one walks the typed candidates in
//! declaration order and takes the first whose descriptors accept the
//! arguments; pass two takes the first untyped candidate. Methods and
//! metamethods then fall through to the super record; constructors never do.

use std::rc::Rc;

use super::Vm;
use crate::object::{Method, ParamType, RecordRef};
use crate::registry::IdentityRegistry;
use crate::value::Value;

/// Which member list the resolver searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Constructors of the record itself; the name is ignored
    Constructor,
    /// Regular methods with the given name
    Method,
    /// Metamethods with the given name
    Metamethod,
}

fn candidates(record: &RecordRef, mode: ResolveMode) -> Rc<[Rc<Method>]> {
    match mode {
        ResolveMode::Constructor => record.constructors(),
        ResolveMode::Method => record.methods(),
        ResolveMode::Metamethod => record.metamethods(),
    }
}

fn accepts(registry: &IdentityRegistry, param: &ParamType, arg: Option<&Value>) -> bool {
    match param {
        ParamType::Any => true,
        ParamType::TypeName(name) => Value::type_name_of(arg) == &**name,
        ParamType::Class(wanted) => {
            let (Some(wanted), Some(arg)) = (wanted.upgrade(), arg) else {
                return false;
            };
            match registry.lookup(arg) {
                Some(record) => record.descends_from(&wanted),
                None => false,
            }
        }
        // Only meaningful as the last slot, which is never checked.
        ParamType::Vararg => false,
    }
}

/// Whether a typed candidate accepts `args`
pub(crate) fn signature_matches(registry: &IdentityRegistry, method: &Method, args: &[Value]) -> bool {
    let params = method.params();
    let Some(last) = params.last() else {
        return false;
    };
    let checked = if last.is_vararg() {
        method.arity() - 1
    } else if method.arity() != args.len() {
        return false;
    } else {
        method.arity()
    };
    params[..checked]
        .iter()
        .enumerate()
        .all(|(slot, param)| accepts(registry, param, args.get(slot)))
}

pub(crate) fn resolve_in(
    registry: &IdentityRegistry,
    record: &RecordRef,
    mode: ResolveMode,
    name: &str,
    args: &[Value],
    include_super: bool,
    eligible: &dyn Fn(&Method) -> bool,
) -> Option<Rc<Method>> {
    let mut current = Some(record.clone());
    while let Some(record) = current {
        let list = candidates(&record, mode);
        let named = |m: &&Rc<Method>| {
            (mode == ResolveMode::Constructor || m.name() == name) && eligible(Rc::as_ref(m))
        };

        let typed = list
            .iter()
            .filter(named)
            .find(|m| m.is_typed() && signature_matches(registry, m, args));
        if let Some(found) = typed {
            tracing::trace!(record = %record, name, slot = "typed", "overload resolved");
            return Some(found.clone());
        }

        let untyped = list.iter().filter(named).find(|m| !m.is_typed());
        if let Some(found) = untyped {
            tracing::trace!(record = %record, name, slot = "untyped", "overload resolved");
            return Some(found.clone());
        }

        if !include_super || mode == ResolveMode::Constructor {
            break;
        }
        current = record.super_record().cloned();
    }
    None
}

impl Vm {
    /// Resolve the overload of `name` that `args` select on `record`
    ///
    /// Returns `None` rather than failing; callers pick the error.
    #[tracing::instrument(skip(self, record, args), fields(record = %record, argc = args.len()))]
    pub fn resolve(
        &self,
        record: &RecordRef,
        mode: ResolveMode,
        name: &str,
        args: &[Value],
        include_super: bool,
    ) -> Option<Rc<Method>> {
        resolve_in(&self.registry, record, mode, name, args, include_super, &|_: &Method| true)
    }
}
