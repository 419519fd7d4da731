//! Table definition for Memtx database schema.

use super::column::Column;
use super::constraint::{Constraints, ForeignKey};
use super::index::{IndexDef, IndexedColumn, IndexType};
use crate::error::{Error, Result};
use crate::row::Row;
use crate::types::DataType;
use crate::value::Value;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// A table definition in the database schema.
#[derive(Clone, Debug)]
pub struct Table {
    /// Table name.
    name: String,
    /// Column definitions.
    columns: Vec<Column>,
    /// Index definitions.
    indices: Vec<IndexDef>,
    /// Table constraints.
    constraints: Constraints,
    /// Whether to persist indices.
    persistent_index: bool,
}

impl Table {
    /// Creates a new table with the given name and columns.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let name = name.into();
        let columns: Vec<Column> = columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.with_index(i))
            .collect();

        Self {
            name,
            columns,
            indices: Vec::new(),
            constraints: Constraints::new(),
            persistent_index: false,
        }
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the indices.
    #[inline]
    pub fn indices(&self) -> &[IndexDef] {
        &self.indices
    }

    /// Returns the constraints.
    #[inline]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Returns whether indices should be persisted.
    #[inline]
    pub fn persistent_index(&self) -> bool {
        self.persistent_index
    }

    /// Gets a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a column index by name.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Gets an index by name.
    pub fn get_index(&self, name: &str) -> Option<&IndexDef> {
        self.indices.iter().find(|i| i.name() == name)
    }

    /// Returns the primary key index if defined.
    pub fn primary_key(&self) -> Option<&IndexDef> {
        self.constraints.get_primary_key()
    }

    /// Projects the key a row would occupy in the given index: a single
    /// column's value for a single-column index, or a `Value::Tuple` of the
    /// column values in index-definition order for a composite index.
    /// Columns missing from the row (e.g. a row built before a column was
    /// added) project to `Value::Null`.
    pub fn index_key_for(&self, index: &IndexDef, row: &Row) -> Value {
        let mut values = index.columns().iter().map(|col| {
            self.get_column_index(&col.name)
                .and_then(|i| row.get(i))
                .cloned()
                .unwrap_or(Value::Null)
        });
        if index.is_single_column() {
            values.next().unwrap_or(Value::Null)
        } else {
            Value::Tuple(values.collect())
        }
    }
}

/// Builder for creating table definitions.
pub struct TableBuilder {
    name: String,
    columns: Vec<Column>,
    indices: Vec<IndexDef>,
    pk_name: Option<String>,
    pk_columns: Vec<IndexedColumn>,
    unique_columns: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
    persistent_index: bool,
}

impl TableBuilder {
    /// Creates a new table builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        Ok(Self {
            name,
            columns: Vec::new(),
            indices: Vec::new(),
            pk_name: None,
            pk_columns: Vec::new(),
            unique_columns: Vec::new(),
            foreign_keys: Vec::new(),
            persistent_index: false,
        })
    }

    /// Validates a name follows naming rules.
    fn check_naming_rules(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSchema {
                message: "Name cannot be empty".into(),
            });
        }
        let first = name.chars().next().unwrap();
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::InvalidSchema {
                message: format!("Name must start with letter or underscore: {}", name),
            });
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::InvalidSchema {
                message: format!("Name contains invalid characters: {}", name),
            });
        }
        Ok(())
    }

    /// Adds a column to the table.
    pub fn add_column(mut self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        if self.columns.iter().any(|c| c.name() == name) {
            return Err(Error::InvalidSchema {
                message: format!("Column already exists: {}", name),
            });
        }
        self.columns.push(Column::new(name, data_type));
        Ok(self)
    }

    /// Adds a nullable column.
    pub fn add_nullable(mut self, columns: &[&str]) -> Self {
        for name in columns {
            if let Some(col) = self.columns.iter_mut().find(|c| c.name() == *name) {
                *col = col.clone().nullable(true);
            }
        }
        self
    }

    /// Sets the primary key.
    pub fn add_primary_key(mut self, columns: &[&str], auto_increment: bool) -> Result<Self> {
        let pk_name = format!("pk{}", capitalize(&self.name));
        Self::check_naming_rules(&pk_name)?;

        let indexed_cols: Vec<IndexedColumn> = columns
            .iter()
            .map(|name| {
                IndexedColumn::new(*name).auto_increment(auto_increment && columns.len() == 1)
            })
            .collect();

        // Validate columns exist and are indexable
        for col in &indexed_cols {
            let column = self.columns.iter().find(|c| c.name() == col.name);
            match column {
                None => {
                    return Err(Error::InvalidSchema {
                        message: format!("Column not found: {}", col.name),
                    })
                }
                Some(c) if !c.is_indexable() => {
                    return Err(Error::InvalidSchema {
                        message: format!("Column is not indexable: {}", col.name),
                    })
                }
                Some(c) if col.auto_increment && c.data_type() != DataType::Int32 && c.data_type() != DataType::Int64 => {
                    return Err(Error::InvalidSchema {
                        message: "Auto-increment requires integer type".into(),
                    })
                }
                _ => {}
            }
        }

        if columns.len() == 1 {
            self.unique_columns.push(columns[0].to_string());
        }

        self.pk_name = Some(pk_name);
        self.pk_columns = indexed_cols;
        Ok(self)
    }

    /// Adds a unique constraint.
    pub fn add_unique(mut self, name: impl Into<String>, columns: &[&str]) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;

        let indexed_cols: Vec<IndexedColumn> =
            columns.iter().map(|n| IndexedColumn::new(*n)).collect();

        // Validate columns
        for col in &indexed_cols {
            if !self.columns.iter().any(|c| c.name() == col.name) {
                return Err(Error::InvalidSchema {
                    message: format!("Column not found: {}", col.name),
                });
            }
        }

        if columns.len() == 1 {
            self.unique_columns.push(columns[0].to_string());
        }

        let idx = IndexDef::new(name, &self.name, indexed_cols).unique(true);
        self.indices.push(idx);
        Ok(self)
    }

    /// Adds an index.
    /// For JSONB columns, automatically uses GIN index type.
    pub fn add_index(
        mut self,
        name: impl Into<String>,
        columns: &[&str],
        unique: bool,
    ) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;

        let indexed_cols: Vec<IndexedColumn> =
            columns.iter().map(|n| IndexedColumn::new(*n)).collect();

        // Validate columns and determine index type
        let mut use_gin = false;
        for col in &indexed_cols {
            let column = self.columns.iter().find(|c| c.name() == col.name);
            match column {
                None => {
                    return Err(Error::InvalidSchema {
                        message: format!("Column not found: {}", col.name),
                    })
                }
                Some(c) if c.data_type() == DataType::Jsonb => {
                    // JSONB columns use GIN index
                    use_gin = true;
                }
                Some(c) if !c.is_indexable() => {
                    return Err(Error::InvalidSchema {
                        message: format!("Column is not indexable: {}", col.name),
                    })
                }
                _ => {}
            }
        }

        let mut idx = IndexDef::new(name, &self.name, indexed_cols).unique(unique);
        if use_gin {
            idx = idx.index_type(IndexType::Gin);
        }
        self.indices.push(idx);
        Ok(self)
    }

    /// Adds a foreign key constraint.
    pub fn add_foreign_key(
        mut self,
        name: impl Into<String>,
        child_column: &str,
        parent_table: &str,
        parent_column: &str,
    ) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;

        if !self.columns.iter().any(|c| c.name() == child_column) {
            return Err(Error::InvalidSchema {
                message: format!("Column not found: {}", child_column),
            });
        }

        let fk = ForeignKey::new(
            &name,
            &self.name,
            child_column,
            parent_table,
            parent_column,
        );
        self.foreign_keys.push(fk);

        // Add index for foreign key column
        let is_unique = self.unique_columns.contains(&child_column.to_string());
        self = self.add_index(&name, &[child_column], is_unique)?;
        Ok(self)
    }

    /// Sets whether to persist indices.
    pub fn persistent_index(mut self, value: bool) -> Self {
        self.persistent_index = value;
        self
    }

    /// Builds the table definition.
    pub fn build(self) -> Result<Table> {
        // Build constraints
        let mut constraints = Constraints::new();

        // Collect all indices (including primary key)
        let mut all_indices = self.indices;

        // Add primary key
        if let Some(pk_name) = &self.pk_name {
            let pk = IndexDef::new(pk_name, &self.name, self.pk_columns.clone()).unique(true);
            // Add primary key to indices list so it's available for query optimization
            all_indices.push(pk.clone());
            constraints = constraints.primary_key(pk);
        }

        // Add not-nullable columns
        let not_nullable: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !c.is_nullable())
            .map(|c| c.name().to_string())
            .collect();
        constraints = constraints.not_nullable(not_nullable);

        // Add foreign keys
        for fk in self.foreign_keys {
            constraints = constraints.add_foreign_key(fk);
        }

        // Build columns with indices
        let columns: Vec<Column> = self
            .columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                let is_unique = self.unique_columns.contains(&c.name().to_string());
                c.unique(is_unique).with_index(i)
            })
            .collect();

        Ok(Table {
            name: self.name,
            columns,
            indices: all_indices,
            constraints,
            persistent_index: self.persistent_index,
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().chain(chars).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_builder() {
        let table = TableBuilder::new("users")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .add_column("email", DataType::String)
            .unwrap()
            .add_primary_key(&["id"], true)
            .unwrap()
            .add_unique("uq_email", &["email"])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(table.name(), "users");
        assert_eq!(table.columns().len(), 3);
        assert!(table.primary_key().is_some());
    }

    #[test]
    fn test_table_get_column() {
        let table = TableBuilder::new("test")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .build()
            .unwrap();

        assert!(table.get_column("id").is_some());
        assert!(table.get_column("name").is_some());
        assert!(table.get_column("unknown").is_none());
    }

    #[test]
    fn test_invalid_column_name() {
        let result = TableBuilder::new("test")
            .unwrap()
            .add_column("123invalid", DataType::Int32);

        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_column() {
        let result = TableBuilder::new("test")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("id", DataType::Int64);

        assert!(result.is_err());
    }

    #[test]
    fn test_primary_key_in_indices() {
        let table = TableBuilder::new("users")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .add_primary_key(&["id"], true)
            .unwrap()
            .build()
            .unwrap();

        // Primary key should be in indices list
        let indices = table.indices();

        assert!(indices.iter().any(|idx| idx.name() == "pkUsers"),
            "Primary key index 'pkUsers' should be in indices list");
        assert!(indices.iter().any(|idx| idx.columns().iter().any(|c| c.name == "id")),
            "Primary key index should contain 'id' column");
    }

    #[test]
    fn test_index_key_for_single_column() {
        let table = TableBuilder::new("users")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .add_primary_key(&["id"], false)
            .unwrap()
            .build()
            .unwrap();

        let row = Row::new(7, alloc::vec![Value::Int64(7), Value::String("ok".into())]);
        let key = table.index_key_for(table.primary_key().unwrap(), &row);
        assert_eq!(key, Value::Int64(7));
    }

    #[test]
    fn test_index_key_for_composite() {
        let table = TableBuilder::new("events")
            .unwrap()
            .add_column("tenant", DataType::String)
            .unwrap()
            .add_column("seq", DataType::Int64)
            .unwrap()
            .add_index("idx_tenant_seq", &["tenant", "seq"], false)
            .unwrap()
            .build()
            .unwrap();

        let row = Row::new(1, alloc::vec![Value::String("acme".into()), Value::Int64(3)]);
        let idx = table.get_index("idx_tenant_seq").unwrap();
        let key = table.index_key_for(idx, &row);
        assert_eq!(
            key,
            Value::Tuple(alloc::vec![Value::String("acme".into()), Value::Int64(3)])
        );
    }
}
