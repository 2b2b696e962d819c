//! Live round-trip against a real Postgres server.
//!
//! Requires `TEST_DATABASE_URL` in the `Server=…;Database=…;User Id=…;
//! Password=…;` grammar; the test is skipped when it is unset so the suite
//! passes without a database.

use std::env;

use anyhow::{Context, Result, anyhow};
use schemagate_core::{
    AlterTableOperation, ColumnDefinition, PrimaryKeyDefinition, TableDefinition, TableKind,
};
use schemagate_handler::{PostgresSchemaHandler, SchemaHandler};

fn connection_string() -> Option<String> {
    env::var("TEST_DATABASE_URL").ok()
}

fn column(ordinal: i16, name: &str, data_type: &str, nullable: bool) -> ColumnDefinition {
    ColumnDefinition {
        ordinal_position: ordinal,
        name: name.to_string(),
        data_type: data_type.to_string(),
        is_nullable: nullable,
        default: None,
        character_max_length: None,
        numeric_precision: None,
        numeric_scale: None,
        collation: None,
    }
}

#[tokio::test]
async fn table_ddl_round_trip() -> Result<()> {
    let Some(conn) = connection_string() else {
        eprintln!("skipping: set TEST_DATABASE_URL to run Postgres integration tests");
        return Ok(());
    };

    let handler = PostgresSchemaHandler::connect(&conn).context("parsing TEST_DATABASE_URL")?;
    let database = handler.profile().database.clone();

    // Start from a clean slate in case a previous run aborted.
    let _ = handler.drop_table(&database, "gateway_smoke").await;

    let definition = TableDefinition {
        schema: "public".to_string(),
        name: "gateway_smoke".to_string(),
        kind: TableKind::Table,
        columns: vec![
            column(1, "id", "bigint", false),
            column(2, "label", "text", true),
        ],
        primary_key: Some(PrimaryKeyDefinition {
            name: None,
            columns: vec!["id".to_string()],
        }),
    };

    handler.create_table(&database, &definition).await?;

    let fetched = handler.get_table(&database, "gateway_smoke").await?;
    assert_eq!(fetched.kind, TableKind::Table);
    let names: Vec<&str> = fetched.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "label"]);
    let pk = fetched
        .primary_key
        .as_ref()
        .ok_or_else(|| anyhow!("expected a primary key"))?;
    assert_eq!(pk.columns, vec!["id".to_string()]);

    let mut widened = fetched.clone();
    widened
        .columns
        .push(column(3, "created_at", "timestamptz", true));
    handler
        .alter_table(
            &database,
            &fetched,
            &widened,
            &AlterTableOperation::AddColumns,
        )
        .await?;

    let altered = handler.get_table(&database, "gateway_smoke").await?;
    assert!(altered.columns.iter().any(|c| c.name == "created_at"));

    handler.drop_table(&database, "gateway_smoke").await?;
    let missing = handler.get_table(&database, "gateway_smoke").await;
    assert!(missing.is_err(), "table should be gone after drop");

    handler.close().await;
    Ok(())
}

#[tokio::test]
async fn discovery_lists_the_connected_server_and_database() -> Result<()> {
    let Some(conn) = connection_string() else {
        eprintln!("skipping: set TEST_DATABASE_URL to run Postgres integration tests");
        return Ok(());
    };

    let handler = PostgresSchemaHandler::connect(&conn).context("parsing TEST_DATABASE_URL")?;
    let database = handler.profile().database.clone();

    let servers = handler.list_servers().await?;
    assert!(!servers.is_empty());
    assert!(servers[0].version.is_some());

    let databases = handler.list_databases().await?;
    assert!(databases.iter().any(|db| db.name == database));

    let fetched = handler.get_database(&database).await?;
    assert_eq!(fetched.name, database);

    handler.close().await;
    Ok(())
}
