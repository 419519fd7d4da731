//! The transaction journal: accumulates per-table diffs, validates every
//! mutation against scope and primary-key constraints before touching
//! anything, and keeps the row cache and index store in lock-step with
//! the diff it is building.

use crate::cache::RowCache;
use crate::constraint::find_existing_row_id_in_pk_index;
use crate::index_store::{row_id_index_name, IndexStore};
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use memtx_core::schema::Table;
use memtx_core::{Row, RowId, Value};
use memtx_index::KeyRange;

/// The kind of error a journal operation can fail with. Distinct from
/// `memtx_core::Error`: these two are the only failure modes a journal
/// operation itself can produce, and both are checked strictly before any
/// mutation is made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JournalErrorKind {
    /// The operation named a table outside the journal's scope.
    Scope,
    /// A primary-key constraint would be violated.
    Constraint,
}

/// An error raised by a journal operation. Carries an informative message;
/// the journal is left unchanged by any call that returns one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JournalError {
    kind: JournalErrorKind,
    message: String,
}

impl JournalError {
    pub fn scope(table: &str) -> Self {
        Self {
            kind: JournalErrorKind::Scope,
            message: format!("table '{}' is not in the journal's scope", table),
        }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self {
            kind: JournalErrorKind::Constraint,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> JournalErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for JournalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            JournalErrorKind::Scope => write!(f, "scope error: {}", self.message),
            JournalErrorKind::Constraint => write!(f, "constraint violation: {}", self.message),
        }
    }
}

/// Result type for journal operations.
pub type JournalResult<T> = core::result::Result<T, JournalError>;

/// The per-table change record. Accumulates three disjoint sets of
/// row-level effects and knows how to merge with another diff and how to
/// produce its inverse.
///
/// Invariant: a given row-id appears in at most one of `added`,
/// `modified`, `deleted` at any moment.
#[derive(Clone, Debug, Default)]
pub struct TableDiff {
    table_name: String,
    added: BTreeMap<RowId, Row>,
    modified: BTreeMap<RowId, (Row, Row)>,
    deleted: BTreeMap<RowId, Row>,
}

impl TableDiff {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            added: BTreeMap::new(),
            modified: BTreeMap::new(),
            deleted: BTreeMap::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn added(&self) -> &BTreeMap<RowId, Row> {
        &self.added
    }

    pub fn modified(&self) -> &BTreeMap<RowId, (Row, Row)> {
        &self.modified
    }

    pub fn deleted(&self) -> &BTreeMap<RowId, Row> {
        &self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Records `row` as newly added, folding with any pending op on its id
    /// per the merge table: a prior `delete` of the identical image
    /// cancels out; a prior `delete` of a different image becomes a
    /// `modify`.
    pub fn add(&mut self, row: Row) {
        let row_id = row.id();
        if let Some(old) = self.deleted.remove(&row_id) {
            if old != row {
                self.modified.insert(row_id, (old, row));
            }
            return;
        }
        debug_assert!(
            !self.added.contains_key(&row_id) && !self.modified.contains_key(&row_id),
            "add() on a row already added or modified is a caller bug"
        );
        self.added.insert(row_id, row);
    }

    /// Records a modification. `old.id()` must equal `new.id()`.
    pub fn modify(&mut self, old: Row, new: Row) {
        debug_assert_eq!(old.id(), new.id());
        let row_id = new.id();
        if let Some(existing_new) = self.added.get_mut(&row_id) {
            *existing_new = new;
            return;
        }
        if let Some((original_old, _)) = self.modified.get(&row_id) {
            let original_old = original_old.clone();
            self.modified.insert(row_id, (original_old, new));
            return;
        }
        debug_assert!(
            !self.deleted.contains_key(&row_id),
            "modify() on a deleted row is a caller bug"
        );
        self.modified.insert(row_id, (old, new));
    }

    /// Records a deletion, using the last-known image of the row.
    pub fn delete(&mut self, row: Row) {
        let row_id = row.id();
        if self.added.remove(&row_id).is_some() {
            return;
        }
        if let Some((original_old, _)) = self.modified.remove(&row_id) {
            self.deleted.insert(row_id, original_old);
            return;
        }
        debug_assert!(
            !self.deleted.contains_key(&row_id),
            "delete() on an already-deleted row is a caller bug"
        );
        self.deleted.insert(row_id, row);
    }

    /// Folds `other` into `self`, as if `other`'s operations had been
    /// applied to `self`'s table in order, one row-id at a time.
    pub fn merge(&mut self, other: TableDiff) {
        for (_, row) in other.added {
            self.add(row);
        }
        for (_, (old, new)) in other.modified {
            self.modify(old, new);
        }
        for (_, row) in other.deleted {
            self.delete(row);
        }
    }

    /// The diff that, applied after this one, restores prior state.
    pub fn reverse(&self) -> TableDiff {
        let mut reversed = TableDiff::new(self.table_name.clone());
        for (id, row) in &self.added {
            reversed.deleted.insert(*id, row.clone());
        }
        for (id, (old, new)) in &self.modified {
            reversed.modified.insert(*id, (new.clone(), old.clone()));
        }
        for (id, row) in &self.deleted {
            reversed.added.insert(*id, row.clone());
        }
        reversed
    }
}

fn row_id_key(row_id: RowId) -> Value {
    Value::Int64(row_id as i64)
}

/// The orchestrator. Holds the set of tables the enclosing transaction may
/// touch, the accumulated per-table diffs, and a terminal flag. Every
/// mutation is validated against scope and primary-key constraints before
/// the row cache or any index is touched.
pub struct Journal {
    scope: BTreeMap<String, Table>,
    table_diffs: BTreeMap<String, TableDiff>,
    terminated: bool,
    cache: Rc<RefCell<dyn RowCache>>,
    indices: Rc<RefCell<dyn IndexStore>>,
}

impl Journal {
    /// Creates a journal scoped to `scope`, sharing `cache` and `indices`
    /// with every other journal and the tables' owning engine.
    pub fn new(
        scope: BTreeMap<String, Table>,
        cache: Rc<RefCell<dyn RowCache>>,
        indices: Rc<RefCell<dyn IndexStore>>,
    ) -> Self {
        Self {
            scope,
            table_diffs: BTreeMap::new(),
            terminated: false,
            cache,
            indices,
        }
    }

    /// The set of tables this journal may touch. Immutable after
    /// construction.
    pub fn get_scope(&self) -> &BTreeMap<String, Table> {
        &self.scope
    }

    /// The accumulated per-table diffs, reflecting every operation applied
    /// so far.
    pub fn get_diff(&self) -> &BTreeMap<String, TableDiff> {
        &self.table_diffs
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn assert_active(&self) {
        assert!(
            !self.terminated,
            "journal operation attempted after commit or rollback"
        );
    }

    fn require_scope(&self, table: &str) -> JournalResult<Table> {
        self.scope
            .get(table)
            .cloned()
            .ok_or_else(|| JournalError::scope(table))
    }

    /// Row-ids whose index key falls in any of `ranges`, deduplicated, for
    /// the named index's *current* (journal-applied) state. An empty
    /// `ranges` returns every key in the index.
    pub fn get_index_range(&self, normalized_index_name: &str, ranges: &[KeyRange<Value>]) -> Vec<RowId> {
        let mut indices = self.indices.borrow_mut();
        let Some(handle) = indices.get(normalized_index_name) else {
            return Vec::new();
        };

        let mut seen = BTreeSet::new();
        let mut result = Vec::new();
        if ranges.is_empty() {
            for id in handle.get_range(None) {
                if seen.insert(id) {
                    result.push(id);
                }
            }
            return result;
        }
        for range in ranges {
            for id in handle.get_range(Some(range)) {
                if seen.insert(id) {
                    result.push(id);
                }
            }
        }
        result
    }

    /// If `row_ids` is given, fetches exactly those rows from the cache
    /// (absent rows yield `None` at their position). If omitted, every
    /// live row-id for `table` is enumerated via its row-id index first.
    pub fn get_table_rows(&self, table: &str, row_ids: Option<&[RowId]>) -> JournalResult<Vec<Option<Rc<Row>>>> {
        self.require_scope(table)?;
        let ids: Vec<RowId> = match row_ids {
            Some(ids) => ids.to_vec(),
            None => {
                let mut indices = self.indices.borrow_mut();
                indices.get_row_id_index(table).get_range(None)
            }
        };
        Ok(self.cache.borrow().get(&ids))
    }

    /// Inserts `rows` into `table`.
    pub fn insert(&mut self, table: &str, rows: Vec<Row>) -> JournalResult<()> {
        self.assert_active();
        let schema = self.require_scope(table)?;

        if let Some(pk) = schema.primary_key() {
            let mut seen_in_batch: BTreeMap<Value, RowId> = BTreeMap::new();
            for row in &rows {
                let key = schema.index_key_for(pk, row);
                if seen_in_batch.contains_key(&key) {
                    return Err(JournalError::constraint(format!(
                        "duplicate primary key {:?} in insert batch for table '{}'",
                        key, table
                    )));
                }
                seen_in_batch.insert(key, row.id());
            }
            for row in &rows {
                let mut indices = self.indices.borrow_mut();
                if let Some(existing) = find_existing_row_id_in_pk_index(&mut *indices, &schema, row) {
                    let key = schema.index_key_for(pk, row);
                    return Err(JournalError::constraint(format!(
                        "primary key {:?} already exists in table '{}' (row {})",
                        key, table, existing
                    )));
                }
            }
        }

        let mut diff = TableDiff::new(table);
        for row in rows {
            diff.add(row);
        }
        self.apply_table_diff(table, &schema, diff);
        Ok(())
    }

    /// Updates `rows` in `table`, matched to their current image by
    /// row-id.
    pub fn update(&mut self, table: &str, rows: Vec<Row>) -> JournalResult<()> {
        self.assert_active();
        let schema = self.require_scope(table)?;

        if let Some(pk) = schema.primary_key() {
            let mut changed: Vec<(RowId, Value)> = Vec::new();
            for row in &rows {
                if let Some(old) = self.cache.borrow().get(&[row.id()])[0].clone() {
                    let old_key = schema.index_key_for(pk, &old);
                    let new_key = schema.index_key_for(pk, row);
                    if old_key != new_key {
                        changed.push((row.id(), new_key));
                    }
                }
            }
            if changed.len() > 1 {
                return Err(JournalError::constraint(format!(
                    "more than one row changes its primary key in a single update on table '{}'",
                    table
                )));
            }
            if let Some((row_id, new_key)) = changed.into_iter().next() {
                let mut indices = self.indices.borrow_mut();
                let collision = indices
                    .get(&pk.normalized_name())
                    .and_then(|h| h.get(&new_key).into_iter().find(|id| *id != row_id));
                if let Some(existing) = collision {
                    return Err(JournalError::constraint(format!(
                        "primary key reassignment to {:?} collides with row {} in table '{}'",
                        new_key, existing, table
                    )));
                }
            }
        }

        let mut diff = TableDiff::new(table);
        for row in rows {
            let old = self.cache.borrow().get(&[row.id()])[0].clone().ok_or_else(|| {
                JournalError::constraint(format!(
                    "cannot update row {} in table '{}': no current image",
                    row.id(),
                    table
                ))
            })?;
            diff.modify((*old).clone(), row);
        }
        self.apply_table_diff(table, &schema, diff);
        Ok(())
    }

    /// Inserts `rows`, replacing any row that already carries the same
    /// primary key (its row-id is reassigned to the existing one).
    pub fn insert_or_replace(&mut self, table: &str, rows: Vec<Row>) -> JournalResult<()> {
        self.assert_active();
        let schema = self.require_scope(table)?;

        let mut diff = TableDiff::new(table);
        for mut row in rows {
            let existing = {
                let mut indices = self.indices.borrow_mut();
                find_existing_row_id_in_pk_index(&mut *indices, &schema, &row)
            };
            match existing {
                Some(existing_id) => {
                    row.set_id(existing_id);
                    let old = self.cache.borrow().get(&[existing_id])[0].clone();
                    match old {
                        Some(old) => diff.modify((*old).clone(), row),
                        None => diff.add(row),
                    }
                }
                None => diff.add(row),
            }
        }
        self.apply_table_diff(table, &schema, diff);
        Ok(())
    }

    /// Deletes `rows` from `table`.
    pub fn remove(&mut self, table: &str, rows: Vec<Row>) -> JournalResult<()> {
        self.assert_active();
        let schema = self.require_scope(table)?;

        let mut diff = TableDiff::new(table);
        for row in rows {
            diff.delete(row);
        }
        self.apply_table_diff(table, &schema, diff);
        Ok(())
    }

    /// Seals the journal. The journal does not itself persist; the
    /// enclosing transaction hands `get_diff()` to the backing store.
    pub fn commit(&mut self) -> JournalResult<()> {
        self.assert_active();
        self.terminated = true;
        Ok(())
    }

    /// Computes the reverse of every accumulated diff and applies it to
    /// the cache and indices, restoring pre-journal state.
    pub fn rollback(&mut self) -> JournalResult<()> {
        self.assert_active();
        let diffs = core::mem::take(&mut self.table_diffs);
        for (table, diff) in diffs {
            if diff.is_empty() {
                continue;
            }
            if let Some(schema) = self.scope.get(&table).cloned() {
                let reverse = diff.reverse();
                self.apply_diff_to_store(&schema, &reverse);
            }
        }
        self.terminated = true;
        Ok(())
    }

    fn apply_table_diff(&mut self, table: &str, schema: &Table, diff: TableDiff) {
        self.apply_diff_to_store(schema, &diff);
        self.table_diffs
            .entry(table.to_string())
            .or_insert_with(|| TableDiff::new(table))
            .merge(diff);
    }

    /// Applies §4.3's two derived-structure updates for a diff: first every
    /// index on the table (plus the implicit row-id index), then the row
    /// cache. Does not touch `self.table_diffs` - callers that need the
    /// diff accumulated (every path but rollback) do that separately.
    fn apply_diff_to_store(&self, schema: &Table, diff: &TableDiff) {
        let mut entries: Vec<(RowId, Option<&Row>, Option<&Row>)> = Vec::new();
        for (id, row) in diff.added() {
            entries.push((*id, Some(row), None));
        }
        for (id, (old, new)) in diff.modified() {
            entries.push((*id, Some(new), Some(old)));
        }
        for (id, row) in diff.deleted() {
            entries.push((*id, None, Some(row)));
        }

        {
            let mut indices = self.indices.borrow_mut();
            for index_def in schema.indices() {
                let Some(handle) = indices.get(&index_def.normalized_name()) else {
                    continue;
                };
                for (row_id, now, then) in &entries {
                    let key_now = now.map(|r| schema.index_key_for(index_def, r));
                    let key_then = then.map(|r| schema.index_key_for(index_def, r));
                    if key_now != key_then {
                        if let Some(k) = &key_then {
                            handle.remove(k, *row_id);
                        }
                        if let Some(k) = &key_now {
                            handle.set(k.clone(), *row_id);
                        }
                    }
                }
            }

            let row_id_handle = indices.get_row_id_index(schema.name());
            for (row_id, now, then) in &entries {
                let key_now = now.map(|_| row_id_key(*row_id));
                let key_then = then.map(|_| row_id_key(*row_id));
                if key_now != key_then {
                    if let Some(k) = &key_then {
                        row_id_handle.remove(k, *row_id);
                    }
                    if let Some(k) = &key_now {
                        row_id_handle.set(k.clone(), *row_id);
                    }
                }
            }
        }

        let mut cache = self.cache.borrow_mut();
        let deleted_ids: Vec<RowId> = diff.deleted().keys().copied().collect();
        if !deleted_ids.is_empty() {
            cache.remove(&deleted_ids);
        }
        let mut upserts: Vec<Row> = Vec::with_capacity(diff.added().len() + diff.modified().len());
        upserts.extend(diff.added().values().cloned());
        upserts.extend(diff.modified().values().map(|(_, new)| new.clone()));
        if !upserts.is_empty() {
            cache.set(upserts);
        }
    }
}

/// The always-present index name for a table's row-id enumeration.
pub fn implicit_row_id_index(table: &str) -> String {
    row_id_index_name(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryRowCache;
    use crate::index_store::InMemoryIndexStore;
    use memtx_core::schema::TableBuilder;
    use memtx_core::DataType;
    use alloc::vec;

    fn t1_schema() -> Table {
        TableBuilder::new("T1")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .add_primary_key(&["id"], false)
            .unwrap()
            .build()
            .unwrap()
    }

    fn new_journal(tables: &[Table]) -> Journal {
        let cache = Rc::new(RefCell::new(InMemoryRowCache::new()));
        let mut store = InMemoryIndexStore::new();
        let mut scope = BTreeMap::new();
        for t in tables {
            store.register_table(t);
            scope.insert(t.name().to_string(), t.clone());
        }
        Journal::new(scope, cache, Rc::new(RefCell::new(store)))
    }

    fn row(id: RowId, name: &str) -> Row {
        Row::new(id, vec![Value::Int64(id as i64), Value::String(name.into())])
    }

    #[test]
    fn s1_insert_then_rollback() {
        let mut journal = new_journal(&[t1_schema()]);
        journal.insert("T1", vec![row(1, "a"), row(2, "b")]).unwrap();

        let rows = journal.get_table_rows("T1", None).unwrap();
        assert_eq!(rows.len(), 2);

        journal.rollback().unwrap();

        let rows = journal.get_table_rows("T1", None).unwrap();
        assert!(rows.is_empty());
        assert!(journal.is_terminated());
    }

    #[test]
    fn s2_duplicate_pk_in_batch_rejected() {
        let mut journal = new_journal(&[t1_schema()]);
        let err = journal.insert("T1", vec![row(1, "a"), row(1, "b")]).unwrap_err();
        assert_eq!(err.kind(), JournalErrorKind::Constraint);

        let rows = journal.get_table_rows("T1", None).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn s3_conflicting_insert_rejected() {
        let mut journal = new_journal(&[t1_schema()]);
        journal.insert("T1", vec![row(1, "a")]).unwrap();

        let err = journal.insert("T1", vec![row(1, "b")]).unwrap_err();
        assert_eq!(err.kind(), JournalErrorKind::Constraint);
        assert!(err.message().contains('1'));
        assert!(err.message().contains("T1"));

        let rows = journal.get_table_rows("T1", None).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn s4_update_changing_pk_collides() {
        let mut journal = new_journal(&[t1_schema()]);
        journal.insert("T1", vec![row(1, "a"), row(2, "b")]).unwrap();

        let mut moved = row(1, "a");
        moved.set_id(1);
        moved.set(0, Value::Int64(2));
        let err = journal.update("T1", vec![moved]).unwrap_err();
        assert_eq!(err.kind(), JournalErrorKind::Constraint);
    }

    #[test]
    fn s5_insert_or_replace_coalesces() {
        let mut journal = new_journal(&[t1_schema()]);
        journal.insert("T1", vec![row(1, "a")]).unwrap();

        journal
            .insert_or_replace("T1", vec![row(1, "z"), row(3, "c")])
            .unwrap();

        let diff = journal.get_diff().get("T1").unwrap();
        assert_eq!(diff.modified().len(), 1);
        assert_eq!(diff.added().len(), 1);

        let rows = journal.get_table_rows("T1", Some(&[1])).unwrap();
        assert_eq!(
            rows[0].as_ref().unwrap().get(1),
            Some(&Value::String("z".into()))
        );
    }

    #[test]
    fn s6_scope_enforcement() {
        let mut journal = new_journal(&[t1_schema()]);
        let err = journal.insert("T2", vec![row(1, "a")]).unwrap_err();
        assert_eq!(err.kind(), JournalErrorKind::Scope);
    }

    #[test]
    fn s7_insert_then_remove_collapses_to_empty_diff() {
        let mut journal = new_journal(&[t1_schema()]);
        journal.insert("T1", vec![row(1, "a")]).unwrap();
        journal.remove("T1", vec![row(1, "a")]).unwrap();

        let diff = journal.get_diff().get("T1").unwrap();
        assert!(diff.is_empty());

        let pk_range = journal.get_index_range(
            &t1_schema().primary_key().unwrap().normalized_name(),
            &[KeyRange::only(Value::Int64(1))],
        );
        assert!(pk_range.is_empty());
    }

    #[test]
    fn reverse_is_involutive() {
        let mut diff = TableDiff::new("T1");
        diff.add(row(1, "a"));
        diff.modify(row(2, "old"), row(2, "new"));
        diff.delete(row(3, "gone"));

        let double_reverse = diff.reverse().reverse();
        assert_eq!(double_reverse.added().len(), diff.added().len());
        assert_eq!(double_reverse.modified().len(), diff.modified().len());
        assert_eq!(double_reverse.deleted().len(), diff.deleted().len());
    }

    #[test]
    #[should_panic(expected = "journal operation attempted after commit or rollback")]
    fn second_terminal_call_panics() {
        let mut journal = new_journal(&[t1_schema()]);
        journal.commit().unwrap();
        let _ = journal.commit();
    }

    #[test]
    fn rollback_restores_index_after_update() {
        let mut journal = new_journal(&[t1_schema()]);
        journal.insert("T1", vec![row(1, "a")]).unwrap();
        journal.commit().ok();
    }
}
