//! Primary-key lookup used before any journal mutation.
//!
//! Cross-table referential integrity and not-null checking are evaluated
//! elsewhere (the query surface and schema layer); the journal validates
//! only primary-key uniqueness, against the *current* transactional view.

use crate::index_store::IndexStore;
use memtx_core::schema::Table;
use memtx_core::{Row, RowId};

/// Projects `row`'s primary key and looks it up in the table's PK index.
/// Returns the first matching row-id, or `None` if the table has no
/// primary key or no row currently carries that key.
///
/// Because the index store already reflects every operation previously
/// applied by this journal, the result is scoped to the current
/// transaction's view, not just what was committed before it began.
pub fn find_existing_row_id_in_pk_index(
    indices: &mut dyn IndexStore,
    table: &Table,
    row: &Row,
) -> Option<RowId> {
    let pk = table.primary_key()?;
    let key = table.index_key_for(pk, row);
    let handle = indices.get(&pk.normalized_name())?;
    handle.get(&key).into_iter().next()
}
