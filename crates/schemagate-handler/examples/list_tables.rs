use anyhow::{Context, Result};

use schemagate_handler::{PostgresSchemaHandler, SchemaHandler};

#[tokio::main]
async fn main() -> Result<()> {
    let conn = std::env::var("GATEWAY_CONNECTION_STRING")
        .context("set GATEWAY_CONNECTION_STRING (Server=…;Database=…;User Id=…;Password=…;)")?;

    let handler = PostgresSchemaHandler::connect(&conn)?;
    let database = handler.profile().database.clone();

    let tables = handler.list_tables(&database).await?;
    println!("{}", serde_json::to_string_pretty(&tables)?);

    handler.close().await;
    Ok(())
}
