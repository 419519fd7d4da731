//! Index store: the journal's view of per-table secondary indices and the
//! always-present row-id index, addressed by normalized index name.
//!
//! The journal never touches a `BTreeIndex`/`HashIndex` directly - it goes
//! through [`IndexHandle`], a narrow point/range/insert/remove seam, and
//! reaches a table's indices through [`IndexStore`]. This mirrors how
//! `cache.rs` hides row storage behind [`crate::cache::RowCache`]: both
//! collaborators are swappable without the journal's algorithms changing.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use memtx_core::schema::{IndexType, Table};
use memtx_core::{RowId, Value};
use memtx_index::{BTreeIndex, HashIndex, Index, KeyRange, RangeIndex};

/// A single index as the journal needs it: point lookup, range scan,
/// insertion and removal, keyed by the projected column value(s).
pub trait IndexHandle {
    /// The normalized name of this index (`"<table>.<index>"`, or
    /// `"<table>.$rowId"` for the implicit row-id index).
    fn name(&self) -> &str;
    /// Row-ids whose projected key equals `key`.
    fn get(&self, key: &Value) -> Vec<RowId>;
    /// Row-ids whose projected key falls in `range`. `None` means every key.
    fn get_range(&self, range: Option<&KeyRange<Value>>) -> Vec<RowId>;
    /// Associates `key` with `row_id`.
    fn set(&mut self, key: Value, row_id: RowId);
    /// Disassociates `key` from `row_id`.
    fn remove(&mut self, key: &Value, row_id: RowId);
}

struct BTreeHandle {
    name: String,
    inner: BTreeIndex<Value>,
}

impl IndexHandle for BTreeHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &Value) -> Vec<RowId> {
        self.inner.get(key)
    }

    fn get_range(&self, range: Option<&KeyRange<Value>>) -> Vec<RowId> {
        self.inner.get_range(range, false, None, 0)
    }

    fn set(&mut self, key: Value, row_id: RowId) {
        self.inner.set(key, row_id);
    }

    fn remove(&mut self, key: &Value, row_id: RowId) {
        self.inner.remove(key, Some(row_id));
    }
}

struct HashHandle {
    name: String,
    inner: HashIndex<Value>,
}

impl IndexHandle for HashHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &Value) -> Vec<RowId> {
        self.inner.get(key)
    }

    fn get_range(&self, range: Option<&KeyRange<Value>>) -> Vec<RowId> {
        match range {
            None => self.inner.get_all_row_ids(),
            Some(r) if r.is_all() => self.inner.get_all_row_ids(),
            Some(r) => self
                .inner
                .entries()
                .filter(|(k, _)| r.contains(k))
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect(),
        }
    }

    fn set(&mut self, key: Value, row_id: RowId) {
        self.inner.set(key, row_id);
    }

    fn remove(&mut self, key: &Value, row_id: RowId) {
        self.inner.remove(key, Some(row_id));
    }
}

fn new_handle(normalized_name: String, unique: bool, index_type: IndexType) -> Box<dyn IndexHandle> {
    match index_type {
        IndexType::Hash => Box::new(HashHandle {
            name: normalized_name,
            inner: HashIndex::new(unique),
        }),
        IndexType::BTree | IndexType::Gin => Box::new(BTreeHandle {
            name: normalized_name,
            inner: BTreeIndex::new(64, unique),
        }),
    }
}

/// Normalized name of the implicit per-table row-id index.
pub fn row_id_index_name(table: &str) -> String {
    format!("{}.$rowId", table)
}

/// Yields, by normalized index name, the index object backing it; also
/// yields the always-present per-table row-id index.
pub trait IndexStore {
    /// Looks up an index by its normalized name (`"<table>.<index>"`).
    fn get(&mut self, normalized_name: &str) -> Option<&mut dyn IndexHandle>;
    /// The per-table row-id index, enumerating every live row-id.
    fn get_row_id_index(&mut self, table: &str) -> &mut dyn IndexHandle;
}

/// An in-memory [`IndexStore`] built from table schemas: one handle per
/// declared index (including the primary key) plus one row-id index per
/// table, created when the table is registered.
#[derive(Default)]
pub struct InMemoryIndexStore {
    indices: BTreeMap<String, Box<dyn IndexHandle>>,
    row_id_indices: BTreeMap<String, Box<dyn IndexHandle>>,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every index declared on `schema`, plus its row-id index.
    /// Called once when a table enters scope.
    pub fn register_table(&mut self, schema: &Table) {
        for idx in schema.indices() {
            let handle = new_handle(idx.normalized_name(), idx.is_unique(), idx.get_index_type());
            self.indices.insert(idx.normalized_name(), handle);
        }
        self.row_id_indices.insert(
            schema.name().to_string(),
            Box::new(BTreeHandle {
                name: row_id_index_name(schema.name()),
                inner: BTreeIndex::new(64, true),
            }),
        );
    }
}

impl IndexStore for InMemoryIndexStore {
    fn get(&mut self, normalized_name: &str) -> Option<&mut dyn IndexHandle> {
        self.indices.get_mut(normalized_name).map(|b| b.as_mut())
    }

    fn get_row_id_index(&mut self, table: &str) -> &mut dyn IndexHandle {
        self.row_id_indices
            .get_mut(table)
            .expect("row-id index must exist for every scoped table")
            .as_mut()
    }
}
