use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A database server known to the handler.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerDefinition {
    pub name: String,
    /// Reported version, when the server was reachable for introspection.
    pub version: Option<String>,
}

/// Database-level definition used for discovery and database DDL.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseDefinition {
    pub name: String,
    pub owner: Option<String>,
    pub encoding: Option<String>,
    pub collation: Option<String>,
    pub connection_limit: Option<i32>,
    /// On-disk size in bytes, populated by discovery only.
    pub size_bytes: Option<i64>,
}

impl DatabaseDefinition {
    /// Definition with only a name, the minimum needed for `CREATE DATABASE`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            encoding: None,
            collation: None,
            connection_limit: None,
            size_bytes: None,
        }
    }
}

/// Kind of table-like object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Table,
    PartitionedTable,
    View,
    MaterializedView,
    ForeignTable,
    Other(String),
}

/// A table-like object with its columns and primary key.
///
/// Equality is structural: two definitions are equal when every field,
/// including the full column sequence, matches. Alter-table planning relies
/// on this to detect differences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TableDefinition {
    pub schema: String,
    pub name: String,
    pub kind: TableKind,
    /// Columns in physical order.
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Option<PrimaryKeyDefinition>,
}

/// Column metadata for a table-like object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ColumnDefinition {
    pub ordinal_position: i16,
    pub name: String,
    /// Formatted, dialect-specific type name (e.g. `character varying(255)`).
    pub data_type: String,
    pub is_nullable: bool,
    /// Default expression, verbatim from the dialect.
    pub default: Option<String>,
    pub character_max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    /// Explicit collation; `None` means the column uses the type default.
    pub collation: Option<String>,
}

/// Primary key definition preserving column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PrimaryKeyDefinition {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Kind of routine behind a stored-procedure definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Function,
    Procedure,
}

/// A stored routine (function or procedure).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoredProcedureDefinition {
    pub schema: String,
    pub name: String,
    pub kind: RoutineKind,
    pub language: String,
    /// Argument list text as reported by the dialect.
    pub arguments: String,
    /// Result type; `None` for procedures.
    pub return_type: Option<String>,
    /// Full definition text.
    pub definition: String,
}

/// When a trigger fires relative to its statement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

/// Event that can fire a trigger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
    Truncate,
}

/// A trigger attached to a table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TriggerDefinition {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub timing: TriggerTiming,
    pub events: Vec<TriggerEvent>,
    pub for_each_row: bool,
    /// Name of the function the trigger invokes.
    pub function: String,
    pub enabled: bool,
    /// Full definition text.
    pub definition: String,
}
