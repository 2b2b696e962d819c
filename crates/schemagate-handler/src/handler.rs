use async_trait::async_trait;

use schemagate_core::{
    AlterTableOperation, DatabaseDefinition, Result, ServerDefinition, StoredProcedureDefinition,
    TableDefinition, TableTypeDefinition, TriggerDefinition,
};

/// Trait implemented by adapters that can inspect and mutate database schema.
///
/// Discovery operations are read-only and idempotent; single-object lookups
/// fail with [`schemagate_core::Error::NotFound`] rather than returning
/// something empty. Mutation operations are DDL and not idempotent; failed
/// preconditions surface as [`schemagate_core::Error::DdlConflict`].
///
/// A handler owns its underlying connection resources. [`close`] releases
/// them deterministically and may be called more than once. Handlers are
/// `Send + Sync`, but no ordering is guaranteed between concurrent DDL calls
/// against the same object; callers serialize conflicting mutations.
///
/// [`close`]: SchemaHandler::close
#[async_trait]
pub trait SchemaHandler: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Read-only connection string for the handler's target.
    fn connection_string(&self) -> &str;

    /// Servers visible from this handler's connection.
    async fn list_servers(&self) -> Result<Vec<ServerDefinition>>;

    /// Definition of a single database, by exact name.
    async fn get_database(&self, name: &str) -> Result<DatabaseDefinition>;

    /// All databases on the server.
    async fn list_databases(&self) -> Result<Vec<DatabaseDefinition>>;

    /// Definition of a single table. `table` may be schema-qualified
    /// (`schema.name`); unqualified names resolve against `public`.
    async fn get_table(&self, database: &str, table: &str) -> Result<TableDefinition>;

    /// All tables in a database, across non-system schemas.
    async fn list_tables(&self, database: &str) -> Result<Vec<TableDefinition>>;

    /// Definition of a single stored routine, by exact name.
    async fn get_procedure(
        &self,
        database: &str,
        name: &str,
    ) -> Result<StoredProcedureDefinition>;

    /// All stored routines in a database.
    async fn list_procedures(&self, database: &str) -> Result<Vec<StoredProcedureDefinition>>;

    /// Definition of a single trigger, by exact name.
    async fn get_trigger(&self, database: &str, name: &str) -> Result<TriggerDefinition>;

    /// All triggers in a database.
    async fn list_triggers(&self, database: &str) -> Result<Vec<TriggerDefinition>>;

    /// Definition of a single user-defined table type, by exact name.
    async fn get_table_type(&self, database: &str, name: &str) -> Result<TableTypeDefinition>;

    /// All user-defined table types in a database.
    async fn list_table_types(&self, database: &str) -> Result<Vec<TableTypeDefinition>>;

    /// Create a database from its definition.
    async fn create_database(&self, definition: &DatabaseDefinition) -> Result<()>;

    /// Apply the alterable properties of a database definition.
    async fn alter_database(&self, definition: &DatabaseDefinition) -> Result<()>;

    /// Drop a database by name.
    async fn drop_database(&self, name: &str) -> Result<()>;

    /// Create a table from its definition.
    async fn create_table(&self, database: &str, definition: &TableDefinition) -> Result<()>;

    /// Apply `operation` to move a table from `old` to `new`. The caller
    /// computes the diff and names the operation; the handler validates
    /// consistency before anything executes.
    async fn alter_table(
        &self,
        database: &str,
        old: &TableDefinition,
        new: &TableDefinition,
        operation: &AlterTableOperation,
    ) -> Result<()>;

    /// Drop a table by name.
    async fn drop_table(&self, database: &str, table: &str) -> Result<()>;

    /// Release the underlying connection resources. Idempotent.
    async fn close(&self);
}

/// Split a possibly schema-qualified object name into `(schema, name)`,
/// defaulting the schema to `public`.
pub fn parse_qualified_name(name: &str) -> (&str, &str) {
    match name.split_once('.') {
        Some((schema, rest)) if !schema.is_empty() => (schema, rest),
        _ => ("public", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_names_split_on_first_dot() {
        assert_eq!(parse_qualified_name("app.users"), ("app", "users"));
        assert_eq!(parse_qualified_name("users"), ("public", "users"));
        assert_eq!(parse_qualified_name(".users"), ("public", ".users"));
    }
}
