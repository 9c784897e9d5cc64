//! Per-revision memo of field results.

use crate::model::element::ElementId;
use crate::validation::FieldResult;
use std::collections::BTreeMap;

/// Results memoized for one snapshot revision.
///
/// Storing a result for a newer revision drops everything older, so a hit
/// can never come from a stale snapshot.
#[derive(Debug, Default)]
pub struct ValidationCache {
    revision: u64,
    entries: BTreeMap<ElementId, FieldResult>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, revision: u64, id: ElementId) -> Option<&FieldResult> {
        if revision != self.revision {
            return None;
        }
        self.entries.get(&id)
    }

    pub fn insert(&mut self, revision: u64, id: ElementId, result: FieldResult) {
        if revision != self.revision {
            self.entries.clear();
            self.revision = revision;
        }
        self.entries.insert(id, result);
    }

    pub fn invalidate(&mut self, id: ElementId) {
        self.entries.remove(&id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ValidationCache;
    use crate::validation::FieldResult;
    use uuid::Uuid;

    #[test]
    fn newer_revision_evicts_older_entries() {
        let mut cache = ValidationCache::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        cache.insert(1, first, FieldResult::valid());
        cache.insert(2, second, FieldResult::invalid("required"));

        assert!(cache.get(1, first).is_none());
        assert!(cache.get(2, first).is_none());
        assert_eq!(cache.get(2, second), Some(&FieldResult::invalid("required")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_drops_one_entry() {
        let mut cache = ValidationCache::new();
        let id = Uuid::new_v4();
        cache.insert(3, id, FieldResult::valid());
        cache.invalidate(id);
        assert!(cache.is_empty());
    }
}
