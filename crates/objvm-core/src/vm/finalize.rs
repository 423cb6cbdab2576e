//! Object finalization
//!
//! Objects whose class chain declares a `__gc` metamethod are tracked with a
//! strong reference. Once that reference is the only one left, the next
//! collection calls `__gc` with the object as receiver and releases it. The
//! super-object of a tracked object is finalized with it, not separately.
//! Each object is finalized at most once; an object resurrected by its own
//! `__gc` is not tracked again.

use std::rc::Rc;

use super::Vm;
use crate::object::RecordRef;

/// Metamethod run when an object becomes unreachable
pub const FINALIZER: &str = "__gc";

fn declares_finalizer(class: &RecordRef) -> bool {
    class
        .chain()
        .any(|record| record.metamethods().iter().any(|m| m.name() == FINALIZER))
}

impl Vm {
    /// Track a freshly built object if its class chain has a finalizer
    pub(crate) fn track_finalizer(&mut self, object: &RecordRef, class: &RecordRef) {
        if let Some(super_object) = object.super_record() {
            self.finalizers.retain(|pending| !Rc::ptr_eq(pending, super_object));
        }
        if declares_finalizer(class) {
            self.finalizers.push(object.clone());
        }
    }

    /// Objects waiting for their `__gc`
    pub fn pending_finalizers(&self) -> usize {
        self.finalizers.len()
    }

    /// Finalize unreferenced objects until none are left; releasing one may
    /// free another.
    pub(crate) fn run_finalizers(&mut self) -> usize {
        let mut finalized = 0;
        loop {
            let (ready, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.finalizers)
                .into_iter()
                .partition(|record| Rc::strong_count(record) == 1);
            // Objects built by a finalizer were pushed onto the emptied list.
            self.finalizers.extend(pending);
            if ready.is_empty() {
                return finalized;
            }
            for record in ready {
                self.finalize(&record);
                finalized += 1;
            }
        }
    }

    fn finalize(&mut self, record: &RecordRef) {
        tracing::debug!(object = %record, "finalizing object");
        if let Err(err) = self.meta_call(record, FINALIZER, &[]) {
            tracing::warn!(object = %record, error = %err, "finalizer failed");
        }
    }
}

impl Drop for Vm {
    fn drop(&mut self) {
        for record in std::mem::take(&mut self.finalizers) {
            self.finalize(&record);
        }
    }
}
