//! Memtx Storage - the transaction journal for the Memtx in-memory database.
//!
//! This crate provides:
//!
//! - `journal`: `Journal` and `TableDiff` - the per-transaction change buffer that
//!   validates every mutation against scope and primary-key constraints, then keeps
//!   the row cache and every index on the table in lock-step with the diff it builds.
//! - `cache`: `RowCache` - the row-id -> row-image mapping the journal reads and writes.
//! - `index_store`: `IndexStore` - per-table secondary indices plus the always-present
//!   row-id index, addressed by normalized index name.
//! - `constraint`: the primary-key lookup the journal runs before any mutation.
//! - `lock`: `LockManager` - serializes journals whose scopes overlap.
//! - `transaction`: `Transaction` - the thin lifecycle wrapper an engine uses to
//!   acquire locks, drive a journal through its operations, and release them on the
//!   journal's terminal call.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::collections::BTreeMap;
//! use std::rc::Rc;
//!
//! use memtx_core::schema::TableBuilder;
//! use memtx_core::{DataType, Row, Value};
//! use memtx_storage::cache::InMemoryRowCache;
//! use memtx_storage::index_store::InMemoryIndexStore;
//! use memtx_storage::Journal;
//!
//! let schema = TableBuilder::new("users")
//!     .unwrap()
//!     .add_column("id", DataType::Int64)
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .add_primary_key(&["id"], false)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let cache = Rc::new(RefCell::new(InMemoryRowCache::new()));
//! let mut store = InMemoryIndexStore::new();
//! store.register_table(&schema);
//! let indices = Rc::new(RefCell::new(store));
//!
//! let mut scope = BTreeMap::new();
//! scope.insert(schema.name().to_string(), schema);
//!
//! let mut journal = Journal::new(scope, cache, indices);
//! let row = Row::new(1, vec![Value::Int64(1), Value::String("Alice".into())]);
//! journal.insert("users", vec![row]).unwrap();
//! journal.commit().unwrap();
//! ```

#![no_std]

extern crate alloc;

pub mod cache;
pub mod constraint;
pub mod index_store;
pub mod journal;
pub mod lock;
pub mod transaction;

pub use cache::{InMemoryRowCache, RowCache};
pub use constraint::find_existing_row_id_in_pk_index;
pub use index_store::{IndexHandle, IndexStore, InMemoryIndexStore};
pub use journal::{implicit_row_id_index, Journal, JournalError, JournalErrorKind, JournalResult, TableDiff};
pub use lock::{LockManager, LockType};
pub use transaction::{Transaction, TransactionError, TransactionId, TransactionState};
