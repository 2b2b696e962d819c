use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tokio::sync::Mutex;

use schemagate_core::{
    AlterTableOperation, ConnectionProfile, DatabaseDefinition, Error, ObjectKind, Result,
    ServerDefinition, StoredProcedureDefinition, TableDefinition, TableKind, TableTypeDefinition,
    TriggerDefinition, validate_table,
};

use crate::handler::{SchemaHandler, parse_qualified_name};
use crate::options::HandlerOptions;

pub mod ddl;
mod mapper;
mod queries;
mod utils;

/// Schema handler for PostgreSQL servers.
///
/// A handler is scoped to one server login. Operations are parameterized by
/// database name, and a Postgres connection is bound to a single database,
/// so the handler keeps one lazily-opened pool per target database and
/// closes them all on [`SchemaHandler::close`]. The profile's own database
/// doubles as the maintenance database for server-level operations.
#[derive(Debug)]
pub struct PostgresSchemaHandler {
    profile: ConnectionProfile,
    connection_string: String,
    options: HandlerOptions,
    pools: Mutex<HashMap<String, PgPool>>,
}

impl PostgresSchemaHandler {
    /// Connect using a prebuilt connection string.
    pub fn connect(connection_string: &str) -> Result<Self> {
        let profile = ConnectionProfile::parse(connection_string)?;
        Ok(Self::with_options(profile, HandlerOptions::default()))
    }

    /// Connect using discrete credential components. Equivalent to building
    /// the connection string first and calling [`Self::connect`].
    pub fn connect_with(server: &str, database: &str, user: &str, password: &str) -> Self {
        Self::with_options(
            ConnectionProfile::new(server, database, user, password),
            HandlerOptions::default(),
        )
    }

    /// Build a handler from a profile with explicit options. No connection
    /// is opened until the first operation needs one.
    pub fn with_options(profile: ConnectionProfile, options: HandlerOptions) -> Self {
        let connection_string = profile.to_connection_string();
        Self {
            profile,
            connection_string,
            options,
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// The profile this handler connects with.
    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    fn connect_options(&self, database: &str) -> PgConnectOptions {
        // `server` may carry an explicit port as `host:port`.
        let (host, port) = match self.profile.server.rsplit_once(':') {
            Some((host, port)) => match port.parse::<u16>() {
                Ok(port) => (host, Some(port)),
                Err(_) => (self.profile.server.as_str(), None),
            },
            None => (self.profile.server.as_str(), None),
        };

        let mut options = PgConnectOptions::new()
            .host(host)
            .username(&self.profile.user)
            .password(&self.profile.password)
            .database(database);
        if let Some(port) = port {
            options = options.port(port);
        }
        options
    }

    async fn pool_for(&self, database: &str) -> Result<PgPool> {
        let mut pools = self.pools.lock().await;
        if let Some(pool) = pools.get(database) {
            return Ok(pool.clone());
        }

        let pool = PgPoolOptions::new()
            .max_connections(self.options.max_connections)
            .acquire_timeout(self.options.acquire_timeout)
            .connect_with(self.connect_options(database))
            .await
            .map_err(|err| connect_error(err, database))?;

        tracing::debug!(event = "pool_opened", database = %database);
        pools.insert(database.to_string(), pool.clone());
        Ok(pool)
    }

    async fn maintenance_pool(&self) -> Result<PgPool> {
        self.pool_for(&self.profile.database).await
    }

    /// Close and forget the cached pool for one database, if any.
    async fn evict_pool(&self, database: &str) {
        let pool = self.pools.lock().await.remove(database);
        if let Some(pool) = pool {
            pool.close().await;
            tracing::debug!(event = "pool_closed", database = %database);
        }
    }
}

fn connect_error(err: sqlx::Error, database: &str) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        // 3D000: the login worked but the database does not exist.
        if db_err.code().as_deref() == Some("3D000") {
            return Error::NotFound {
                kind: ObjectKind::Database,
                name: database.to_string(),
            };
        }
    }
    Error::Connectivity(err.to_string())
}

#[async_trait]
impl SchemaHandler for PostgresSchemaHandler {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn list_servers(&self) -> Result<Vec<ServerDefinition>> {
        let pool = self.maintenance_pool().await?;
        let version = queries::server_version(&pool).await?;

        let mut servers = vec![ServerDefinition {
            name: self.profile.server.clone(),
            version: Some(version),
        }];
        servers.extend(
            queries::list_foreign_servers(&pool)
                .await?
                .into_iter()
                .map(|name| ServerDefinition {
                    name,
                    version: None,
                }),
        );
        Ok(servers)
    }

    async fn get_database(&self, name: &str) -> Result<DatabaseDefinition> {
        let pool = self.maintenance_pool().await?;
        let raw = queries::get_database(&pool, name)
            .await?
            .ok_or_else(|| Error::NotFound {
                kind: ObjectKind::Database,
                name: name.to_string(),
            })?;
        Ok(mapper::map_database(raw))
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseDefinition>> {
        let pool = self.maintenance_pool().await?;
        let raw = queries::list_databases(&pool).await?;
        Ok(raw.into_iter().map(mapper::map_database).collect())
    }

    async fn get_table(&self, database: &str, table: &str) -> Result<TableDefinition> {
        let pool = self.pool_for(database).await?;
        let (schema, name) = parse_qualified_name(table);

        let raw = queries::get_table(&pool, schema, name)
            .await?
            .ok_or_else(|| Error::NotFound {
                kind: ObjectKind::Table,
                name: table.to_string(),
            })?;
        let columns = queries::list_columns(&pool, schema, name).await?;
        let pk = queries::get_primary_key(&pool, schema, name).await?;
        Ok(mapper::map_table(raw, columns, pk))
    }

    async fn list_tables(&self, database: &str) -> Result<Vec<TableDefinition>> {
        let pool = self.pool_for(database).await?;

        let mut tables = Vec::new();
        for raw in queries::list_tables(&pool).await? {
            let columns = queries::list_columns(&pool, &raw.schema, &raw.name).await?;
            let pk = queries::get_primary_key(&pool, &raw.schema, &raw.name).await?;
            tables.push(mapper::map_table(raw, columns, pk));
        }
        Ok(tables)
    }

    async fn get_procedure(
        &self,
        database: &str,
        name: &str,
    ) -> Result<StoredProcedureDefinition> {
        let pool = self.pool_for(database).await?;
        let (schema, routine) = parse_qualified_name(name);
        let raw = queries::get_routine(&pool, schema, routine)
            .await?
            .ok_or_else(|| Error::NotFound {
                kind: ObjectKind::StoredProcedure,
                name: name.to_string(),
            })?;
        Ok(mapper::map_routine(raw))
    }

    async fn list_procedures(&self, database: &str) -> Result<Vec<StoredProcedureDefinition>> {
        let pool = self.pool_for(database).await?;
        let raw = queries::list_routines(&pool).await?;
        Ok(raw.into_iter().map(mapper::map_routine).collect())
    }

    async fn get_trigger(&self, database: &str, name: &str) -> Result<TriggerDefinition> {
        let pool = self.pool_for(database).await?;
        let (schema, trigger) = parse_qualified_name(name);
        let raw = queries::get_trigger(&pool, schema, trigger)
            .await?
            .ok_or_else(|| Error::NotFound {
                kind: ObjectKind::Trigger,
                name: name.to_string(),
            })?;
        Ok(mapper::map_trigger(raw))
    }

    async fn list_triggers(&self, database: &str) -> Result<Vec<TriggerDefinition>> {
        let pool = self.pool_for(database).await?;
        let raw = queries::list_triggers(&pool).await?;
        Ok(raw.into_iter().map(mapper::map_trigger).collect())
    }

    async fn get_table_type(&self, database: &str, name: &str) -> Result<TableTypeDefinition> {
        let pool = self.pool_for(database).await?;
        let (schema, type_name) = parse_qualified_name(name);
        let raw = queries::get_table_type(&pool, schema, type_name)
            .await?
            .ok_or_else(|| Error::NotFound {
                kind: ObjectKind::TableType,
                name: name.to_string(),
            })?;
        let columns = queries::list_table_type_columns(&pool, schema, type_name).await?;
        Ok(mapper::map_table_type(raw, columns))
    }

    async fn list_table_types(&self, database: &str) -> Result<Vec<TableTypeDefinition>> {
        let pool = self.pool_for(database).await?;

        let mut types = Vec::new();
        for raw in queries::list_table_types(&pool).await? {
            let columns =
                queries::list_table_type_columns(&pool, &raw.schema, &raw.name).await?;
            types.push(mapper::map_table_type(raw, columns));
        }
        Ok(types)
    }

    async fn create_database(&self, definition: &DatabaseDefinition) -> Result<()> {
        let pool = self.maintenance_pool().await?;
        if queries::database_exists(&pool, &definition.name).await? {
            return Err(Error::DdlConflict(format!(
                "database `{}` already exists",
                definition.name
            )));
        }

        // CREATE DATABASE cannot run inside a transaction block.
        queries::execute_ddl(&pool, &ddl::create_database(definition)).await?;
        tracing::info!(event = "database_created", name = %definition.name);
        Ok(())
    }

    async fn alter_database(&self, definition: &DatabaseDefinition) -> Result<()> {
        let pool = self.maintenance_pool().await?;
        if !queries::database_exists(&pool, &definition.name).await? {
            return Err(Error::DdlConflict(format!(
                "database `{}` does not exist",
                definition.name
            )));
        }

        let statements = ddl::alter_database(definition);
        if statements.is_empty() {
            return Err(Error::DdlConflict(format!(
                "database `{}`: no alterable properties set",
                definition.name
            )));
        }
        for statement in statements {
            queries::execute_ddl(&pool, &statement).await?;
        }
        tracing::info!(event = "database_altered", name = %definition.name);
        Ok(())
    }

    async fn drop_database(&self, name: &str) -> Result<()> {
        if name == self.profile.database {
            return Err(Error::DdlConflict(format!(
                "cannot drop database `{name}` while connected through it"
            )));
        }

        let pool = self.maintenance_pool().await?;
        if !queries::database_exists(&pool, name).await? {
            return Err(Error::DdlConflict(format!("database `{name}` does not exist")));
        }

        // Our own cached pool would otherwise hold the database in use.
        self.evict_pool(name).await;
        queries::execute_ddl(&pool, &ddl::drop_database(name)).await?;
        tracing::info!(event = "database_dropped", name = %name);
        Ok(())
    }

    async fn create_table(&self, database: &str, definition: &TableDefinition) -> Result<()> {
        if definition.kind != TableKind::Table {
            return Err(Error::Unsupported(format!(
                "create_table only creates plain tables, got {:?}",
                definition.kind
            )));
        }
        validate_table(definition)?;

        let pool = self.pool_for(database).await?;
        if queries::relation_exists(&pool, &definition.schema, &definition.name).await? {
            return Err(Error::DdlConflict(format!(
                "relation `{}.{}` already exists",
                definition.schema, definition.name
            )));
        }

        queries::execute_ddl(&pool, &ddl::create_table(definition)).await?;
        tracing::info!(
            event = "table_created",
            schema = %definition.schema,
            name = %definition.name,
        );
        Ok(())
    }

    async fn alter_table(
        &self,
        database: &str,
        old: &TableDefinition,
        new: &TableDefinition,
        operation: &AlterTableOperation,
    ) -> Result<()> {
        let pool = self.pool_for(database).await?;
        if !queries::table_exists(&pool, &old.schema, &old.name).await? {
            return Err(Error::DdlConflict(format!(
                "table `{}.{}` does not exist",
                old.schema, old.name
            )));
        }

        let statements = ddl::alter_table(old, new, operation)?;

        // Table DDL is transactional in Postgres; apply the sequence
        // atomically.
        let mut tx = pool.begin().await.map_err(utils::map_query_error)?;
        for statement in &statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(utils::map_ddl_error)?;
        }
        tx.commit().await.map_err(utils::map_query_error)?;

        tracing::info!(
            event = "table_altered",
            schema = %old.schema,
            name = %old.name,
            operation = %operation,
            statements = statements.len(),
        );
        Ok(())
    }

    async fn drop_table(&self, database: &str, table: &str) -> Result<()> {
        let pool = self.pool_for(database).await?;
        let (schema, name) = parse_qualified_name(table);
        if !queries::table_exists(&pool, schema, name).await? {
            return Err(Error::DdlConflict(format!(
                "table `{schema}.{name}` does not exist"
            )));
        }

        queries::execute_ddl(&pool, &ddl::drop_table(schema, name)).await?;
        tracing::info!(event = "table_dropped", schema = %schema, name = %name);
        Ok(())
    }

    async fn close(&self) {
        let pools: Vec<(String, PgPool)> = self.pools.lock().await.drain().collect();
        for (database, pool) in pools {
            pool.close().await;
            tracing::debug!(event = "pool_closed", database = %database);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete_credentials_build_the_connection_string() {
        let handler = PostgresSchemaHandler::connect_with("srv", "postgres", "app", "pw");
        assert_eq!(
            handler.connection_string(),
            "Server=srv;Database=postgres;User Id=app;Password=pw;"
        );

        let parsed = PostgresSchemaHandler::connect(handler.connection_string()).unwrap();
        assert_eq!(parsed.profile(), handler.profile());
    }

    #[test]
    fn rejects_malformed_connection_string() {
        let err = PostgresSchemaHandler::connect("Server=only;").unwrap_err();
        assert!(matches!(err, Error::MalformedConnectionString(_)));
    }

    #[tokio::test]
    async fn close_is_idempotent_without_connecting() {
        let handler = PostgresSchemaHandler::connect_with("srv", "postgres", "app", "pw");
        handler.close().await;
        handler.close().await;
    }

    #[test]
    fn server_names_may_carry_a_port() {
        let handler = PostgresSchemaHandler::connect_with("db.host:6432", "postgres", "a", "b");
        let options = handler.connect_options("postgres");
        assert_eq!(options.get_host(), "db.host");
        assert_eq!(options.get_port(), 6432);
    }
}
