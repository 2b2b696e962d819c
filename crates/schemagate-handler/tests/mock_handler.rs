//! Contract-level tests exercised against the in-memory handler.

use schemagate_core::{
    AlterTableOperation, ColumnDefinition, DatabaseDefinition, Error, ObjectKind,
    PrimaryKeyDefinition, TableDefinition, TableKind,
};
use schemagate_handler::{MockSchemaHandler, SchemaHandler};

fn column(ordinal: i16, name: &str, data_type: &str) -> ColumnDefinition {
    ColumnDefinition {
        ordinal_position: ordinal,
        name: name.to_string(),
        data_type: data_type.to_string(),
        is_nullable: true,
        default: None,
        character_max_length: None,
        numeric_precision: None,
        numeric_scale: None,
        collation: None,
    }
}

fn users_table() -> TableDefinition {
    let mut id = column(1, "id", "bigint");
    id.is_nullable = false;
    TableDefinition {
        schema: "public".to_string(),
        name: "users".to_string(),
        kind: TableKind::Table,
        columns: vec![id, column(2, "email", "text")],
        primary_key: Some(PrimaryKeyDefinition {
            name: None,
            columns: vec!["id".to_string()],
        }),
    }
}

async fn seeded_handler() -> MockSchemaHandler {
    let handler = MockSchemaHandler::new();
    handler
        .add_database(DatabaseDefinition::named("appdb"))
        .await;
    handler.add_table("appdb", users_table()).await.unwrap();
    handler
}

#[tokio::test]
async fn missing_table_is_not_found_when_connectivity_is_healthy() {
    let handler = seeded_handler().await;

    let err = handler.get_table("appdb", "missing").await.unwrap_err();
    assert!(
        matches!(
            err,
            Error::NotFound {
                kind: ObjectKind::Table,
                ..
            }
        ),
        "expected NotFound, got {err}"
    );
}

#[tokio::test]
async fn connectivity_failure_is_not_reported_as_not_found() {
    let handler = MockSchemaHandler::new().with_connectivity_failure();

    let err = handler.get_table("appdb", "users").await.unwrap_err();
    assert!(matches!(err, Error::Connectivity(_)), "got {err}");
}

#[tokio::test]
async fn get_table_resolves_qualified_and_bare_names() {
    let handler = seeded_handler().await;

    let bare = handler.get_table("appdb", "users").await.unwrap();
    let qualified = handler.get_table("appdb", "public.users").await.unwrap();
    assert_eq!(bare, qualified);
    assert_eq!(bare.columns.len(), 2);
}

#[tokio::test]
async fn create_database_twice_is_a_ddl_conflict() {
    let handler = MockSchemaHandler::new();
    let definition = DatabaseDefinition::named("appdb");

    handler.create_database(&definition).await.unwrap();
    let err = handler.create_database(&definition).await.unwrap_err();
    assert!(matches!(err, Error::DdlConflict(_)), "got {err}");
}

#[tokio::test]
async fn drop_missing_objects_is_a_ddl_conflict() {
    let handler = seeded_handler().await;

    let err = handler.drop_database("nope").await.unwrap_err();
    assert!(matches!(err, Error::DdlConflict(_)));

    let err = handler.drop_table("appdb", "nope").await.unwrap_err();
    assert!(matches!(err, Error::DdlConflict(_)));
}

#[tokio::test]
async fn create_get_drop_table_round_trip() {
    let handler = MockSchemaHandler::new();
    handler
        .add_database(DatabaseDefinition::named("appdb"))
        .await;

    handler.create_table("appdb", &users_table()).await.unwrap();
    let fetched = handler.get_table("appdb", "users").await.unwrap();
    assert_eq!(fetched, users_table());

    handler.drop_table("appdb", "users").await.unwrap();
    let err = handler.get_table("appdb", "users").await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn alter_table_applies_caller_supplied_operation() {
    let handler = seeded_handler().await;

    let old = users_table();
    let mut new = users_table();
    new.columns.push(column(3, "created_at", "timestamptz"));

    handler
        .alter_table("appdb", &old, &new, &AlterTableOperation::AddColumns)
        .await
        .unwrap();
    let fetched = handler.get_table("appdb", "users").await.unwrap();
    assert_eq!(fetched.columns.len(), 3);
}

#[tokio::test]
async fn alter_table_rejects_inconsistent_operation() {
    let handler = seeded_handler().await;
    let same = users_table();

    let err = handler
        .alter_table("appdb", &same, &same.clone(), &AlterTableOperation::DropColumns)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DdlConflict(_)), "got {err}");

    // Nothing was applied.
    let fetched = handler.get_table("appdb", "users").await.unwrap();
    assert_eq!(fetched, users_table());
}

#[tokio::test]
async fn rename_moves_the_table_to_its_new_name() {
    let handler = seeded_handler().await;

    let old = users_table();
    let mut new = users_table();
    new.name = "accounts".to_string();

    handler
        .alter_table("appdb", &old, &new, &AlterTableOperation::RenameTable)
        .await
        .unwrap();

    assert!(handler.get_table("appdb", "users").await.is_err());
    assert!(handler.get_table("appdb", "accounts").await.is_ok());
}

#[tokio::test]
async fn alter_database_merges_alterable_properties() {
    let handler = seeded_handler().await;

    let mut definition = DatabaseDefinition::named("appdb");
    definition.owner = Some("dba".to_string());
    handler.alter_database(&definition).await.unwrap();

    let fetched = handler.get_database("appdb").await.unwrap();
    assert_eq!(fetched.owner.as_deref(), Some("dba"));

    let bare = DatabaseDefinition::named("appdb");
    let err = handler.alter_database(&bare).await.unwrap_err();
    assert!(matches!(err, Error::DdlConflict(_)));
}

#[tokio::test]
async fn close_is_idempotent() {
    let handler = seeded_handler().await;
    handler.close().await;
    handler.close().await;

    // The mock keeps serving after close; only resource release is promised.
    assert!(handler.get_database("appdb").await.is_ok());
}

#[tokio::test]
async fn clones_share_seeded_state() {
    let handler = MockSchemaHandler::new();
    let other = handler.clone();
    handler
        .add_database(DatabaseDefinition::named("shared"))
        .await;

    assert!(other.get_database("shared").await.is_ok());
}
