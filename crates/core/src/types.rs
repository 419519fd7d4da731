//! Data type definitions for Memtx database.
//!
//! This module defines the supported data types that can be stored in the database.

/// Supported data types in Memtx database.
///
/// Maps to the original Lovefield `lf.Type` enum with additions for JSONB support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
    /// Date and time stored as Unix timestamp (milliseconds)
    DateTime,
    /// Binary data
    Bytes,
    /// JSONB type for structured data
    Jsonb,
}

impl DataType {
    /// Returns the default value for this data type as a string representation.
    pub fn default_value_repr(&self) -> &'static str {
        match self {
            DataType::Boolean => "false",
            DataType::Int32 => "0",
            DataType::Int64 => "0",
            DataType::Float64 => "0.0",
            DataType::String => "\"\"",
            DataType::DateTime => "0",
            DataType::Bytes => "[]",
            DataType::Jsonb => "null",
        }
    }

    /// Returns whether this type is nullable by default.
    pub fn is_nullable_by_default(&self) -> bool {
        matches!(self, DataType::Bytes | DataType::Jsonb)
    }

    /// Returns whether this type can be used as an index key.
    pub fn is_indexable(&self) -> bool {
        !matches!(self, DataType::Bytes | DataType::Jsonb)
    }
}
