use std::fmt;

use thiserror::Error;

/// Kind of schema object addressed by name in handler operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Database,
    Table,
    StoredProcedure,
    Trigger,
    TableType,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObjectKind::Database => "database",
            ObjectKind::Table => "table",
            ObjectKind::StoredProcedure => "stored procedure",
            ObjectKind::Trigger => "trigger",
            ObjectKind::TableType => "table type",
        };
        f.write_str(label)
    }
}

/// Core error type shared across Schemagate crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The server cannot be reached or refused authentication.
    #[error("connectivity error: {0}")]
    Connectivity(String),
    /// A named object does not exist for a single-object lookup.
    #[error("{kind} not found: {name}")]
    NotFound { kind: ObjectKind, name: String },
    /// The connection string cannot be parsed.
    #[error("malformed connection string: {0}")]
    MalformedConnectionString(String),
    /// DDL preconditions do not hold for the requested mutation.
    #[error("ddl conflict: {0}")]
    DdlConflict(String),
    /// A definition violates internal invariants.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
    /// A requested operation is not expressible for the object at hand.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// Database error or driver failure.
    #[error("database error: {0}")]
    Db(String),
}

/// Convenience alias for results returned by Schemagate crates.
pub type Result<T> = std::result::Result<T, Error>;
