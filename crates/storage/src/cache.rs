//! Row cache: the journal's single flat view of every live row.
//!
//! Row-ids are unique across every table in a scope (they come from one
//! global counter in `memtx_core::row`), so the cache needs no table
//! parameter on any of its operations - a row-id alone is enough to find,
//! overwrite, or remove a row.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use memtx_core::{Row, RowId};

/// Maps row-id to the latest row image.
pub trait RowCache {
    /// Fetches rows by id, position-preserving; absent ids yield `None`.
    fn get(&self, row_ids: &[RowId]) -> Vec<Option<Rc<Row>>>;
    /// Inserts or overwrites rows by their own id.
    fn set(&mut self, rows: Vec<Row>);
    /// Removes rows by id. Removing an absent id is a no-op.
    fn remove(&mut self, row_ids: &[RowId]);
}

/// A `RowCache` backed by a single `BTreeMap`, shared by every table.
#[derive(Default)]
pub struct InMemoryRowCache {
    rows: BTreeMap<RowId, Rc<Row>>,
}

impl InMemoryRowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of cached rows, across every table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl RowCache for InMemoryRowCache {
    fn get(&self, row_ids: &[RowId]) -> Vec<Option<Rc<Row>>> {
        row_ids.iter().map(|id| self.rows.get(id).cloned()).collect()
    }

    fn set(&mut self, rows: Vec<Row>) {
        for row in rows {
            self.rows.insert(row.id(), Rc::new(row));
        }
    }

    fn remove(&mut self, row_ids: &[RowId]) {
        for id in row_ids {
            self.rows.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use memtx_core::Value;

    #[test]
    fn set_then_get_roundtrips() {
        let mut cache = InMemoryRowCache::new();
        let row = Row::new(1, vec![Value::Int64(1), Value::String("a".into())]);
        cache.set(vec![row.clone()]);

        let found = cache.get(&[1, 2]);
        assert_eq!(found[0].as_deref(), Some(&row));
        assert!(found[1].is_none());
    }

    #[test]
    fn set_overwrites_existing_row() {
        let mut cache = InMemoryRowCache::new();
        cache.set(vec![Row::new(1, vec![Value::Int64(1)])]);
        cache.set(vec![Row::new(1, vec![Value::Int64(2)])]);

        let found = cache.get(&[1]);
        assert_eq!(found[0].as_deref().unwrap().get(0), Some(&Value::Int64(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_deletes_row() {
        let mut cache = InMemoryRowCache::new();
        cache.set(vec![Row::new(1, vec![Value::Int64(1)])]);
        cache.remove(&[1]);

        assert!(cache.get(&[1])[0].is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn rows_from_different_tables_share_one_namespace() {
        let mut cache = InMemoryRowCache::new();
        cache.set(vec![
            Row::new(1, vec![Value::Int64(1)]),
            Row::new(2, vec![Value::Int64(2)]),
        ]);
        assert_eq!(cache.len(), 2);
    }
}
