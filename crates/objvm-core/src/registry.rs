//! Identity registry
//!
//! Weak set of every live class and object. Membership is the test for "this
//! value is a managed record"; entries never keep a record alive. Dead entries
//! are dropped lazily once the table reaches its purge threshold, after which
//! the threshold grows with the live population.

use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::object::{Record, RecordId, RecordRef};
use crate::value::Value;

/// Weak-keyed registry of managed records
#[derive(Debug)]
pub struct IdentityRegistry {
    entries: FxHashMap<RecordId, Weak<Record>>,
    base_threshold: usize,
    threshold: usize,
}

impl IdentityRegistry {
    /// Create a registry that first purges at `threshold` entries
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            entries: FxHashMap::default(),
            base_threshold: threshold,
            threshold,
        }
    }

    /// Register a fully constructed record
    pub fn register(&mut self, record: &RecordRef) {
        if self.entries.len() >= self.threshold {
            self.purge();
        }
        self.entries.insert(record.id(), Rc::downgrade(record));
    }

    /// Whether `record` is registered and alive
    pub fn contains(&self, record: &Record) -> bool {
        self.entries
            .get(&record.id())
            .map_or(false, |entry| entry.strong_count() > 0)
    }

    /// The record behind `value`, if it is a registered record
    pub fn lookup<'v>(&self, value: &'v Value) -> Option<&'v RecordRef> {
        value.as_record().filter(|record| self.contains(record))
    }

    /// Drop entries whose record has been reclaimed. Returns how many were removed.
    pub fn purge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.strong_count() > 0);
        let removed = before - self.entries.len();
        self.threshold = (self.entries.len() * 2).max(self.base_threshold);
        tracing::trace!(removed, live = self.entries.len(), threshold = self.threshold, "registry purge");
        removed
    }

    /// Entries currently held, including dead ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose record is still alive
    pub fn live_count(&self) -> usize {
        self.entries.values().filter(|e| e.strong_count() > 0).count()
    }

    /// Current purge threshold
    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_contains() {
        let mut registry = IdentityRegistry::new(8);
        let class = Record::new_class(Some("A".into()), None);
        let stray = Record::new_class(Some("B".into()), None);
        registry.register(&class);
        assert!(registry.contains(&class));
        assert!(!registry.contains(&stray));

        let value = Value::Record(class.clone());
        assert!(registry.lookup(&value).is_some());
        assert!(registry.lookup(&Value::from(1)).is_none());
    }

    #[test]
    fn test_dropped_records_are_purged() {
        let mut registry = IdentityRegistry::new(8);
        let keep = Record::new_class(None, None);
        registry.register(&keep);
        {
            let temp = Record::new_class(None, None);
            registry.register(&temp);
        }
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.purge(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_threshold_triggers_purge_and_grows() {
        let mut registry = IdentityRegistry::new(2);
        let mut alive = Vec::new();
        for _ in 0..2 {
            let r = Record::new_class(None, None);
            registry.register(&r);
            alive.push(r);
        }
        // Third registration hits the threshold; nothing is dead yet.
        let r = Record::new_class(None, None);
        registry.register(&r);
        alive.push(r);
        assert_eq!(registry.threshold(), 4);
        assert_eq!(registry.len(), 3);
    }
}
