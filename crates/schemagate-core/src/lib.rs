//! Core contracts and helpers for Schemagate.
//!
//! This crate defines the schema definition model, the connection string
//! codec, the error taxonomy, and validation helpers shared by handlers and
//! the CLI.

pub mod alter;
pub mod conn;
pub mod error;
pub mod model;
pub mod table_type;
pub mod validation;

pub use alter::AlterTableOperation;
pub use conn::{ConnectionProfile, break_connection_string, build_connection_string};
pub use error::{Error, ObjectKind, Result};
pub use model::{
    ColumnDefinition, DatabaseDefinition, PrimaryKeyDefinition, RoutineKind, ServerDefinition,
    StoredProcedureDefinition, TableDefinition, TableKind, TriggerDefinition, TriggerEvent,
    TriggerTiming,
};
pub use table_type::{TableTypeColumn, TableTypeDefinition};
pub use validation::{validate_table, validate_table_type};
