use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use schemagate_core::{
    AlterTableOperation, DatabaseDefinition, Error as CoreError, TableDefinition,
    break_connection_string, build_connection_string,
};
use schemagate_handler::{PostgresSchemaHandler, SchemaHandler};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "schemagate", version, about = "Schemagate CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Connection target, either as a prebuilt connection string or as discrete
/// credential components.
#[derive(Args, Debug)]
struct ConnArgs {
    /// Database connection string.
    #[arg(
        long,
        value_name = "CONNECTION_STRING",
        conflicts_with_all = ["server", "user", "password"]
    )]
    conn: Option<String>,
    /// Database server name.
    #[arg(long)]
    server: Option<String>,
    /// Maintenance database to connect through.
    #[arg(long, default_value = "postgres")]
    database: String,
    /// Database user id.
    #[arg(long)]
    user: Option<String>,
    /// Database password.
    #[arg(long)]
    password: Option<String>,
}

impl ConnArgs {
    fn handler(&self) -> Result<PostgresSchemaHandler, CliError> {
        if let Some(conn) = &self.conn {
            return Ok(PostgresSchemaHandler::connect(conn)?);
        }
        match (&self.server, &self.user, &self.password) {
            (Some(server), Some(user), Some(password)) => Ok(
                PostgresSchemaHandler::connect_with(server, &self.database, user, password),
            ),
            _ => Err(CliError::InvalidConfig(
                "pass --conn, or all of --server, --user, and --password".to_string(),
            )),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List servers visible from the connection.
    Servers {
        #[command(flatten)]
        conn: ConnArgs,
    },
    /// Database discovery and DDL.
    #[command(subcommand)]
    Databases(DatabasesCommand),
    /// Table discovery and DDL.
    #[command(subcommand)]
    Tables(TablesCommand),
    /// Stored routine discovery.
    #[command(subcommand)]
    Procs(ProcsCommand),
    /// Trigger discovery.
    #[command(subcommand)]
    Triggers(TriggersCommand),
    /// User-defined table type discovery.
    #[command(subcommand)]
    Types(TypesCommand),
    /// Connection string codec.
    #[command(subcommand)]
    Conn(ConnCommand),
}

#[derive(Subcommand, Debug)]
enum DatabasesCommand {
    /// List all databases on the server.
    List {
        #[command(flatten)]
        conn: ConnArgs,
    },
    /// Show one database by name.
    Show {
        #[command(flatten)]
        conn: ConnArgs,
        name: String,
    },
    /// Create a database.
    Create {
        #[command(flatten)]
        conn: ConnArgs,
        name: String,
        /// Owning role for the database.
        #[arg(long)]
        owner: Option<String>,
        /// Connection limit for the database.
        #[arg(long)]
        connection_limit: Option<i32>,
    },
    /// Apply alterable properties to an existing database.
    Alter {
        #[command(flatten)]
        conn: ConnArgs,
        name: String,
        /// Owning role for the database.
        #[arg(long)]
        owner: Option<String>,
        /// Connection limit for the database.
        #[arg(long)]
        connection_limit: Option<i32>,
    },
    /// Drop a database by name.
    Drop {
        #[command(flatten)]
        conn: ConnArgs,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum TablesCommand {
    /// List all tables in a database.
    List {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
    },
    /// Show one table by (optionally schema-qualified) name.
    Show {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
        table: String,
    },
    /// Create a table from a JSON definition file.
    Create {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
        /// Path to a JSON table definition.
        #[arg(long)]
        file: PathBuf,
    },
    /// Alter a table from old and new JSON definition files.
    Alter {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
        /// Path to the old JSON table definition.
        #[arg(long)]
        old: PathBuf,
        /// Path to the new JSON table definition.
        #[arg(long)]
        new: PathBuf,
        /// Operation to apply: add-columns, drop-columns, alter-columns, rename-table.
        #[arg(long)]
        operation: String,
    },
    /// Drop a table by name.
    Drop {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
        table: String,
    },
}

#[derive(Subcommand, Debug)]
enum ProcsCommand {
    /// List all stored routines in a database.
    List {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
    },
    /// Show one stored routine by name.
    Show {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum TriggersCommand {
    /// List all triggers in a database.
    List {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
    },
    /// Show one trigger by name.
    Show {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum TypesCommand {
    /// List all user-defined table types in a database.
    List {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
    },
    /// Show one user-defined table type by name.
    Show {
        #[command(flatten)]
        conn: ConnArgs,
        db: String,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConnCommand {
    /// Build a connection string from discrete credentials.
    Build {
        server: String,
        database: String,
        user: String,
        password: String,
    },
    /// Break a connection string into its credential components.
    Break { connection_string: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli.command).await
}

async fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Servers { conn } => {
            with_handler(&conn, |handler| async move {
                let servers = handler.list_servers().await?;
                print_json(&servers)
            })
            .await
        }
        Command::Databases(command) => run_databases(command).await,
        Command::Tables(command) => run_tables(command).await,
        Command::Procs(command) => run_procs(command).await,
        Command::Triggers(command) => run_triggers(command).await,
        Command::Types(command) => run_types(command).await,
        Command::Conn(command) => run_conn(command),
    }
}

async fn run_databases(command: DatabasesCommand) -> Result<(), CliError> {
    match command {
        DatabasesCommand::List { conn } => {
            with_handler(&conn, |handler| async move {
                let databases = handler.list_databases().await?;
                print_json(&databases)
            })
            .await
        }
        DatabasesCommand::Show { conn, name } => {
            with_handler(&conn, |handler| async move {
                let database = handler.get_database(&name).await?;
                print_json(&database)
            })
            .await
        }
        DatabasesCommand::Create {
            conn,
            name,
            owner,
            connection_limit,
        } => {
            with_handler(&conn, |handler| async move {
                let mut definition = DatabaseDefinition::named(name);
                definition.owner = owner;
                definition.connection_limit = connection_limit;
                handler.create_database(&definition).await?;
                Ok(())
            })
            .await
        }
        DatabasesCommand::Alter {
            conn,
            name,
            owner,
            connection_limit,
        } => {
            with_handler(&conn, |handler| async move {
                let mut definition = DatabaseDefinition::named(name);
                definition.owner = owner;
                definition.connection_limit = connection_limit;
                handler.alter_database(&definition).await?;
                Ok(())
            })
            .await
        }
        DatabasesCommand::Drop { conn, name } => {
            with_handler(&conn, |handler| async move {
                handler.drop_database(&name).await?;
                Ok(())
            })
            .await
        }
    }
}

async fn run_tables(command: TablesCommand) -> Result<(), CliError> {
    match command {
        TablesCommand::List { conn, db } => {
            with_handler(&conn, |handler| async move {
                let tables = handler.list_tables(&db).await?;
                print_json(&tables)
            })
            .await
        }
        TablesCommand::Show { conn, db, table } => {
            with_handler(&conn, |handler| async move {
                let table = handler.get_table(&db, &table).await?;
                print_json(&table)
            })
            .await
        }
        TablesCommand::Create { conn, db, file } => {
            let definition = read_table_definition(&file)?;
            with_handler(&conn, |handler| async move {
                handler.create_table(&db, &definition).await?;
                Ok(())
            })
            .await
        }
        TablesCommand::Alter {
            conn,
            db,
            old,
            new,
            operation,
        } => {
            let old = read_table_definition(&old)?;
            let new = read_table_definition(&new)?;
            let operation = parse_operation(&operation)?;
            with_handler(&conn, |handler| async move {
                handler.alter_table(&db, &old, &new, &operation).await?;
                Ok(())
            })
            .await
        }
        TablesCommand::Drop { conn, db, table } => {
            with_handler(&conn, |handler| async move {
                handler.drop_table(&db, &table).await?;
                Ok(())
            })
            .await
        }
    }
}

async fn run_procs(command: ProcsCommand) -> Result<(), CliError> {
    match command {
        ProcsCommand::List { conn, db } => {
            with_handler(&conn, |handler| async move {
                let procedures = handler.list_procedures(&db).await?;
                print_json(&procedures)
            })
            .await
        }
        ProcsCommand::Show { conn, db, name } => {
            with_handler(&conn, |handler| async move {
                let procedure = handler.get_procedure(&db, &name).await?;
                print_json(&procedure)
            })
            .await
        }
    }
}

async fn run_triggers(command: TriggersCommand) -> Result<(), CliError> {
    match command {
        TriggersCommand::List { conn, db } => {
            with_handler(&conn, |handler| async move {
                let triggers = handler.list_triggers(&db).await?;
                print_json(&triggers)
            })
            .await
        }
        TriggersCommand::Show { conn, db, name } => {
            with_handler(&conn, |handler| async move {
                let trigger = handler.get_trigger(&db, &name).await?;
                print_json(&trigger)
            })
            .await
        }
    }
}

async fn run_types(command: TypesCommand) -> Result<(), CliError> {
    match command {
        TypesCommand::List { conn, db } => {
            with_handler(&conn, |handler| async move {
                let types = handler.list_table_types(&db).await?;
                print_json(&types)
            })
            .await
        }
        TypesCommand::Show { conn, db, name } => {
            with_handler(&conn, |handler| async move {
                let table_type = handler.get_table_type(&db, &name).await?;
                print_json(&table_type)
            })
            .await
        }
    }
}

fn run_conn(command: ConnCommand) -> Result<(), CliError> {
    match command {
        ConnCommand::Build {
            server,
            database,
            user,
            password,
        } => {
            println!(
                "{}",
                build_connection_string(&server, &database, &user, &password)
            );
            Ok(())
        }
        ConnCommand::Break { connection_string } => {
            let (server, database, user, password) =
                break_connection_string(&connection_string)?;
            print_json(&serde_json::json!({
                "server": server,
                "database": database,
                "user": user,
                "password": password,
            }))
        }
    }
}

/// Run one operation against a freshly built handler, always releasing the
/// handler's connections afterwards, on success or failure.
async fn with_handler<F, Fut>(conn: &ConnArgs, operation: F) -> Result<(), CliError>
where
    F: FnOnce(Arc<PostgresSchemaHandler>) -> Fut,
    Fut: Future<Output = Result<(), CliError>>,
{
    let handler = Arc::new(conn.handler()?);
    tracing::info!(event = "connected", target = %handler.profile().redacted());

    let result = operation(Arc::clone(&handler)).await;
    handler.close().await;
    result
}

fn read_table_definition(path: &PathBuf) -> Result<TableDefinition, CliError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn parse_operation(operation: &str) -> Result<AlterTableOperation, CliError> {
    match operation {
        "add-columns" => Ok(AlterTableOperation::AddColumns),
        "drop-columns" => Ok(AlterTableOperation::DropColumns),
        "alter-columns" => Ok(AlterTableOperation::AlterColumns),
        "rename-table" => Ok(AlterTableOperation::RenameTable),
        other => Err(CliError::InvalidConfig(format!(
            "unknown alter operation `{other}`"
        ))),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
