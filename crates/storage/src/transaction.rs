//! The lifecycle wrapper around a journal: acquires the locks its scope needs,
//! drives the journal through its operations, and releases them on the
//! journal's one allowed terminal call.
//!
//! The spec treats "the enclosing transaction" and "the lock/transaction
//! scheduler" as opaque, out-of-scope collaborators - this module is the
//! ambient plumbing that plays that role in this workspace, not a restatement
//! of the journal's own contract. `Journal` remains the component that
//! actually validates and applies mutations; `Transaction` only sequences
//! lock acquisition around it.

use crate::cache::RowCache;
use crate::index_store::IndexStore;
use crate::journal::{Journal, JournalError, TableDiff};
use crate::lock::{LockManager, LockType};
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use memtx_core::schema::Table;

/// Global transaction-id counter, unique within a process.
static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction identifier.
pub type TransactionId = u64;

/// Lifecycle state of a `Transaction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Locks are held and the journal accepts operations.
    Active,
    /// The journal committed; locks have been released.
    Committed,
    /// The journal rolled back; locks have been released.
    RolledBack,
}

/// Raised by `Transaction::begin`, `commit`, or `rollback`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionError {
    /// A table in the requested scope is already locked by another transaction.
    LockConflict { table: String },
    /// The wrapped journal operation itself failed.
    Journal(JournalError),
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::LockConflict { table } => {
                write!(f, "could not lock table '{}' for this transaction", table)
            }
            TransactionError::Journal(err) => write!(f, "{}", err),
        }
    }
}

/// Pairs a journal with the transaction id used to acquire its locks, and
/// sequences lock release with the journal's terminal call.
pub struct Transaction {
    id: TransactionId,
    journal: Journal,
    state: TransactionState,
}

impl Transaction {
    /// Acquires an exclusive lock on every table in `scope` and constructs the
    /// journal that will mutate them. Fails without acquiring any lock at all
    /// if any single table is already held by another transaction - like the
    /// journal's own validate-before-mutate rule, `begin` either succeeds
    /// whole or leaves the lock manager untouched.
    pub fn begin(
        scope: BTreeMap<String, Table>,
        cache: Rc<RefCell<dyn RowCache>>,
        indices: Rc<RefCell<dyn IndexStore>>,
        locks: &mut LockManager,
    ) -> Result<Self, TransactionError> {
        let id = NEXT_TX_ID.fetch_add(1, Ordering::SeqCst);

        for table in scope.keys() {
            if locks.acquire(table, id, LockType::Exclusive).is_err() {
                locks.release_all(id);
                return Err(TransactionError::LockConflict {
                    table: table.clone(),
                });
            }
        }

        Ok(Self {
            id,
            journal: Journal::new(scope, cache, indices),
            state: TransactionState::Active,
        })
    }

    /// The transaction's id, also the key under which its locks are held.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// The transaction's current lifecycle state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Read-only access to the journal this transaction drives. Every
    /// mutating call (`insert`, `update`, `insert_or_replace`, `remove`,
    /// `get_table_rows`, `get_index_range`) goes straight to it.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Mutable access to the journal, for issuing `insert`/`update`/
    /// `insert_or_replace`/`remove` calls while the transaction is active.
    pub fn journal_mut(&mut self) -> &mut Journal {
        &mut self.journal
    }

    /// Seals the journal and releases this transaction's locks, returning the
    /// accumulated per-table diffs for the backing store to persist.
    pub fn commit(mut self, locks: &mut LockManager) -> Result<BTreeMap<String, TableDiff>, TransactionError> {
        self.journal.commit().map_err(TransactionError::Journal)?;
        self.state = TransactionState::Committed;
        locks.release_all(self.id);
        Ok(self.journal.get_diff().clone())
    }

    /// Reverses the journal's accumulated diffs against the cache and
    /// indices, then releases this transaction's locks.
    pub fn rollback(mut self, locks: &mut LockManager) -> Result<(), TransactionError> {
        self.journal.rollback().map_err(TransactionError::Journal)?;
        self.state = TransactionState::RolledBack;
        locks.release_all(self.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryRowCache;
    use crate::index_store::InMemoryIndexStore;
    use memtx_core::schema::TableBuilder;
    use memtx_core::{DataType, Row, Value};
    use alloc::vec;

    fn users_schema() -> Table {
        TableBuilder::new("users")
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

    fn begin(schema: &Table, locks: &mut LockManager) -> Transaction {
        let cache = Rc::new(RefCell::new(InMemoryRowCache::new()));
        let mut store = InMemoryIndexStore::new();
        store.register_table(schema);
        let mut scope = BTreeMap::new();
        scope.insert(schema.name().to_string(), schema.clone());
        Transaction::begin(scope, cache, Rc::new(RefCell::new(store)), locks).unwrap()
    }

    #[test]
    fn begin_acquires_exclusive_locks_on_every_scoped_table() {
        let schema = users_schema();
        let mut locks = LockManager::new();
        let tx = begin(&schema, &mut locks);

        assert!(locks.holds_exclusive("users", tx.id()));
        assert!(tx.is_active());
    }

    #[test]
    fn begin_fails_without_acquiring_anything_if_one_table_is_held() {
        let schema = users_schema();
        let mut locks = LockManager::new();
        locks.acquire("users", 999, LockType::Exclusive).unwrap();

        let cache = Rc::new(RefCell::new(InMemoryRowCache::new()));
        let mut store = InMemoryIndexStore::new();
        store.register_table(&schema);
        let mut scope = BTreeMap::new();
        scope.insert(schema.name().to_string(), schema.clone());

        let err = Transaction::begin(scope, cache, Rc::new(RefCell::new(store)), &mut locks).unwrap_err();
        assert_eq!(err, TransactionError::LockConflict { table: "users".into() });
        assert!(locks.holds_exclusive("users", 999));
    }

    #[test]
    fn commit_releases_locks_and_hands_back_the_diff() {
        let schema = users_schema();
        let mut locks = LockManager::new();
        let mut tx = begin(&schema, &mut locks);

        tx.journal_mut()
            .insert("users", vec![Row::new(1, vec![Value::Int64(1), Value::String("a".into())])])
            .unwrap();

        let diff = tx.commit(&mut locks).unwrap();
        assert_eq!(diff.get("users").unwrap().added().len(), 1);
        assert!(!locks.holds_lock("users", 1));
    }

    #[test]
    fn rollback_releases_locks_and_restores_state() {
        let schema = users_schema();
        let mut locks = LockManager::new();
        let mut tx = begin(&schema, &mut locks);
        let tx_id = tx.id();

        tx.journal_mut()
            .insert("users", vec![Row::new(1, vec![Value::Int64(1), Value::String("a".into())])])
            .unwrap();

        tx.rollback(&mut locks).unwrap();
        assert!(!locks.holds_lock("users", tx_id));
    }
}
