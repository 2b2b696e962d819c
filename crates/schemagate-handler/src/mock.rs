//! In-memory schema handler for tests.
//!
//! Mirrors the Postgres handler's error semantics without a live server:
//! single-object lookups miss with `NotFound`, DDL preconditions fail with
//! `DdlConflict`, and a connectivity switch turns every operation into
//! `Connectivity`. Useful for exercising callers and the contract itself
//! without real credentials.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use schemagate_core::{
    AlterTableOperation, ConnectionProfile, DatabaseDefinition, Error, ObjectKind, Result,
    ServerDefinition, StoredProcedureDefinition, TableDefinition, TableTypeDefinition,
    TriggerDefinition, validate_table,
};

use crate::diff;
use crate::handler::{SchemaHandler, parse_qualified_name};

#[derive(Clone)]
struct MockDatabase {
    definition: DatabaseDefinition,
    tables: BTreeMap<String, TableDefinition>,
    procedures: BTreeMap<String, StoredProcedureDefinition>,
    triggers: BTreeMap<String, TriggerDefinition>,
    table_types: BTreeMap<String, TableTypeDefinition>,
}

impl MockDatabase {
    fn new(definition: DatabaseDefinition) -> Self {
        Self {
            definition,
            tables: BTreeMap::new(),
            procedures: BTreeMap::new(),
            triggers: BTreeMap::new(),
            table_types: BTreeMap::new(),
        }
    }
}

/// Mock schema handler holding its catalog in memory.
///
/// Clones share state, so a test can seed through one handle and operate
/// through another.
#[derive(Clone)]
pub struct MockSchemaHandler {
    profile: ConnectionProfile,
    connection_string: String,
    fail_connectivity: bool,
    state: Arc<RwLock<BTreeMap<String, MockDatabase>>>,
}

impl MockSchemaHandler {
    pub fn new() -> Self {
        let profile = ConnectionProfile::new("mock", "postgres", "mock", "mock");
        let connection_string = profile.to_connection_string();
        Self {
            profile,
            connection_string,
            fail_connectivity: false,
            state: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Make every operation fail with a connectivity error.
    pub fn with_connectivity_failure(mut self) -> Self {
        self.fail_connectivity = true;
        self
    }

    /// Seed a database.
    pub async fn add_database(&self, definition: DatabaseDefinition) {
        let mut state = self.state.write().await;
        state.insert(definition.name.clone(), MockDatabase::new(definition));
    }

    /// Seed a table into an existing database.
    pub async fn add_table(&self, database: &str, table: TableDefinition) -> Result<()> {
        let mut state = self.state.write().await;
        let db = database_mut(&mut state, database)?;
        db.tables
            .insert(format!("{}.{}", table.schema, table.name), table);
        Ok(())
    }

    /// Seed a stored routine into an existing database.
    pub async fn add_procedure(
        &self,
        database: &str,
        procedure: StoredProcedureDefinition,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let db = database_mut(&mut state, database)?;
        db.procedures
            .insert(format!("{}.{}", procedure.schema, procedure.name), procedure);
        Ok(())
    }

    /// Seed a trigger into an existing database.
    pub async fn add_trigger(&self, database: &str, trigger: TriggerDefinition) -> Result<()> {
        let mut state = self.state.write().await;
        let db = database_mut(&mut state, database)?;
        db.triggers
            .insert(format!("{}.{}", trigger.schema, trigger.name), trigger);
        Ok(())
    }

    /// Seed a user-defined table type into an existing database.
    pub async fn add_table_type(
        &self,
        database: &str,
        table_type: TableTypeDefinition,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let db = database_mut(&mut state, database)?;
        db.table_types
            .insert(format!("public.{}", table_type.name), table_type);
        Ok(())
    }

    fn ensure_online(&self) -> Result<()> {
        if self.fail_connectivity {
            return Err(Error::Connectivity(
                "simulated connection failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MockSchemaHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn database_ref<'a>(
    state: &'a BTreeMap<String, MockDatabase>,
    name: &str,
) -> Result<&'a MockDatabase> {
    state.get(name).ok_or_else(|| Error::NotFound {
        kind: ObjectKind::Database,
        name: name.to_string(),
    })
}

fn database_mut<'a>(
    state: &'a mut BTreeMap<String, MockDatabase>,
    name: &str,
) -> Result<&'a mut MockDatabase> {
    state.get_mut(name).ok_or_else(|| Error::NotFound {
        kind: ObjectKind::Database,
        name: name.to_string(),
    })
}

fn object_key(name: &str) -> String {
    let (schema, bare) = parse_qualified_name(name);
    format!("{schema}.{bare}")
}

#[async_trait]
impl SchemaHandler for MockSchemaHandler {
    fn engine(&self) -> &'static str {
        "mock"
    }

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn list_servers(&self) -> Result<Vec<ServerDefinition>> {
        self.ensure_online()?;
        Ok(vec![ServerDefinition {
            name: self.profile.server.clone(),
            version: None,
        }])
    }

    async fn get_database(&self, name: &str) -> Result<DatabaseDefinition> {
        self.ensure_online()?;
        let state = self.state.read().await;
        state
            .get(name)
            .map(|db| db.definition.clone())
            .ok_or_else(|| Error::NotFound {
                kind: ObjectKind::Database,
                name: name.to_string(),
            })
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseDefinition>> {
        self.ensure_online()?;
        let state = self.state.read().await;
        Ok(state.values().map(|db| db.definition.clone()).collect())
    }

    async fn get_table(&self, database: &str, table: &str) -> Result<TableDefinition> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let db = database_ref(&state, database)?;
        db.tables
            .get(&object_key(table))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: ObjectKind::Table,
                name: table.to_string(),
            })
    }

    async fn list_tables(&self, database: &str) -> Result<Vec<TableDefinition>> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let db = database_ref(&state, database)?;
        Ok(db.tables.values().cloned().collect())
    }

    async fn get_procedure(
        &self,
        database: &str,
        name: &str,
    ) -> Result<StoredProcedureDefinition> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let db = database_ref(&state, database)?;
        db.procedures
            .get(&object_key(name))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: ObjectKind::StoredProcedure,
                name: name.to_string(),
            })
    }

    async fn list_procedures(&self, database: &str) -> Result<Vec<StoredProcedureDefinition>> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let db = database_ref(&state, database)?;
        Ok(db.procedures.values().cloned().collect())
    }

    async fn get_trigger(&self, database: &str, name: &str) -> Result<TriggerDefinition> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let db = database_ref(&state, database)?;
        db.triggers
            .get(&object_key(name))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: ObjectKind::Trigger,
                name: name.to_string(),
            })
    }

    async fn list_triggers(&self, database: &str) -> Result<Vec<TriggerDefinition>> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let db = database_ref(&state, database)?;
        Ok(db.triggers.values().cloned().collect())
    }

    async fn get_table_type(&self, database: &str, name: &str) -> Result<TableTypeDefinition> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let db = database_ref(&state, database)?;
        db.table_types
            .get(&object_key(name))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: ObjectKind::TableType,
                name: name.to_string(),
            })
    }

    async fn list_table_types(&self, database: &str) -> Result<Vec<TableTypeDefinition>> {
        self.ensure_online()?;
        let state = self.state.read().await;
        let db = database_ref(&state, database)?;
        Ok(db.table_types.values().cloned().collect())
    }

    async fn create_database(&self, definition: &DatabaseDefinition) -> Result<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        if state.contains_key(&definition.name) {
            return Err(Error::DdlConflict(format!(
                "database `{}` already exists",
                definition.name
            )));
        }
        state.insert(
            definition.name.clone(),
            MockDatabase::new(definition.clone()),
        );
        Ok(())
    }

    async fn alter_database(&self, definition: &DatabaseDefinition) -> Result<()> {
        self.ensure_online()?;
        if definition.owner.is_none() && definition.connection_limit.is_none() {
            return Err(Error::DdlConflict(format!(
                "database `{}`: no alterable properties set",
                definition.name
            )));
        }

        let mut state = self.state.write().await;
        let Some(db) = state.get_mut(&definition.name) else {
            return Err(Error::DdlConflict(format!(
                "database `{}` does not exist",
                definition.name
            )));
        };
        if let Some(owner) = &definition.owner {
            db.definition.owner = Some(owner.clone());
        }
        if let Some(limit) = definition.connection_limit {
            db.definition.connection_limit = Some(limit);
        }
        Ok(())
    }

    async fn drop_database(&self, name: &str) -> Result<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        if state.remove(name).is_none() {
            return Err(Error::DdlConflict(format!("database `{name}` does not exist")));
        }
        Ok(())
    }

    async fn create_table(&self, database: &str, definition: &TableDefinition) -> Result<()> {
        self.ensure_online()?;
        validate_table(definition)?;

        let mut state = self.state.write().await;
        let db = database_mut(&mut state, database)?;
        let key = format!("{}.{}", definition.schema, definition.name);
        if db.tables.contains_key(&key) {
            return Err(Error::DdlConflict(format!("relation `{key}` already exists")));
        }
        db.tables.insert(key, definition.clone());
        Ok(())
    }

    async fn alter_table(
        &self,
        database: &str,
        old: &TableDefinition,
        new: &TableDefinition,
        operation: &AlterTableOperation,
    ) -> Result<()> {
        self.ensure_online()?;
        diff::validate_operation(old, new, operation)?;

        let mut state = self.state.write().await;
        let db = database_mut(&mut state, database)?;
        let old_key = format!("{}.{}", old.schema, old.name);
        if db.tables.remove(&old_key).is_none() {
            return Err(Error::DdlConflict(format!("table `{old_key}` does not exist")));
        }
        db.tables
            .insert(format!("{}.{}", new.schema, new.name), new.clone());
        Ok(())
    }

    async fn drop_table(&self, database: &str, table: &str) -> Result<()> {
        self.ensure_online()?;
        let mut state = self.state.write().await;
        let db = database_mut(&mut state, database)?;
        let key = object_key(table);
        if db.tables.remove(&key).is_none() {
            return Err(Error::DdlConflict(format!("table `{key}` does not exist")));
        }
        Ok(())
    }

    async fn close(&self) {
        // No pooled resources to release; closing any number of times is fine.
    }
}
