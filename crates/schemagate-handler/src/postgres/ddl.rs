//! DDL statement rendering for the Postgres handler.
//!
//! Everything here is pure string assembly over validated definitions; the
//! handler decides where and in what transaction scope statements run.

use schemagate_core::{
    AlterTableOperation, ColumnDefinition, DatabaseDefinition, Result, TableDefinition,
};

use crate::diff;

/// Quote an identifier for safe interpolation into DDL.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// Render the declared type of a column, appending numeric or length facets
/// only when the declared name does not already carry them.
pub fn render_column_type(column: &ColumnDefinition) -> String {
    if column.data_type.contains('(') {
        return column.data_type.clone();
    }

    let lowered = column.data_type.to_ascii_lowercase();
    if matches!(lowered.as_str(), "numeric" | "decimal") {
        if let Some(precision) = column.numeric_precision {
            return match column.numeric_scale {
                Some(scale) => format!("{}({precision},{scale})", column.data_type),
                None => format!("{}({precision})", column.data_type),
            };
        }
    }

    if matches!(
        lowered.as_str(),
        "varchar" | "character varying" | "char" | "character" | "bit" | "bit varying" | "varbit"
    ) {
        if let Some(length) = column.character_max_length {
            return format!("{}({length})", column.data_type);
        }
    }

    column.data_type.clone()
}

fn render_column(column: &ColumnDefinition) -> String {
    let mut sql = format!(
        "{} {}",
        quote_ident(&column.name),
        render_column_type(column)
    );
    if let Some(collation) = &column.collation {
        sql.push_str(&format!(" COLLATE {}", quote_ident(collation)));
    }
    if !column.is_nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(&format!(" DEFAULT {default}"));
    }
    sql
}

/// Render `CREATE DATABASE` for a database definition.
pub fn create_database(definition: &DatabaseDefinition) -> String {
    let mut sql = format!("CREATE DATABASE {}", quote_ident(&definition.name));
    if let Some(owner) = &definition.owner {
        sql.push_str(&format!(" OWNER {}", quote_ident(owner)));
    }
    if let Some(encoding) = &definition.encoding {
        sql.push_str(&format!(" ENCODING {}", quote_literal(encoding)));
    }
    if let Some(collation) = &definition.collation {
        sql.push_str(&format!(" LC_COLLATE {}", quote_literal(collation)));
    }
    if let Some(limit) = definition.connection_limit {
        sql.push_str(&format!(" CONNECTION LIMIT {limit}"));
    }
    sql
}

/// Statements applying the alterable properties of a database definition.
/// Encoding and collation are fixed at creation time and never emitted here.
pub fn alter_database(definition: &DatabaseDefinition) -> Vec<String> {
    let target = quote_ident(&definition.name);
    let mut statements = Vec::new();
    if let Some(owner) = &definition.owner {
        statements.push(format!("ALTER DATABASE {target} OWNER TO {}", quote_ident(owner)));
    }
    if let Some(limit) = definition.connection_limit {
        statements.push(format!("ALTER DATABASE {target} CONNECTION LIMIT {limit}"));
    }
    statements
}

pub fn drop_database(name: &str) -> String {
    format!("DROP DATABASE {}", quote_ident(name))
}

/// Render `CREATE TABLE` with columns in definition order and the primary
/// key, when present, as a table constraint.
pub fn create_table(table: &TableDefinition) -> String {
    let mut parts: Vec<String> = table.columns.iter().map(render_column).collect();

    if let Some(primary_key) = &table.primary_key {
        let columns = primary_key
            .columns
            .iter()
            .map(|column| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(match &primary_key.name {
            Some(name) => format!("CONSTRAINT {} PRIMARY KEY ({columns})", quote_ident(name)),
            None => format!("PRIMARY KEY ({columns})"),
        });
    }

    format!(
        "CREATE TABLE {} (\n    {}\n)",
        qualified(&table.schema, &table.name),
        parts.join(",\n    ")
    )
}

/// Statement sequence applying `operation` to move a table from `old` to
/// `new`. Fails with `DdlConflict` when the operation is inconsistent with
/// the two definitions; nothing is rendered in that case.
pub fn alter_table(
    old: &TableDefinition,
    new: &TableDefinition,
    operation: &AlterTableOperation,
) -> Result<Vec<String>> {
    diff::validate_operation(old, new, operation)?;

    let target = qualified(&old.schema, &old.name);
    let statements = match operation {
        AlterTableOperation::AddColumns => diff::added_columns(old, new)
            .into_iter()
            .map(|column| format!("ALTER TABLE {target} ADD COLUMN {}", render_column(column)))
            .collect(),
        AlterTableOperation::DropColumns => diff::dropped_columns(old, new)
            .into_iter()
            .map(|column| {
                format!("ALTER TABLE {target} DROP COLUMN {}", quote_ident(&column.name))
            })
            .collect(),
        AlterTableOperation::AlterColumns => {
            let mut statements = Vec::new();
            for (before, after) in diff::changed_columns(old, new) {
                let column = quote_ident(&after.name);
                if before.data_type != after.data_type {
                    statements.push(format!(
                        "ALTER TABLE {target} ALTER COLUMN {column} TYPE {}",
                        render_column_type(after)
                    ));
                }
                if before.is_nullable != after.is_nullable {
                    let clause = if after.is_nullable {
                        "DROP NOT NULL"
                    } else {
                        "SET NOT NULL"
                    };
                    statements.push(format!(
                        "ALTER TABLE {target} ALTER COLUMN {column} {clause}"
                    ));
                }
                if before.default != after.default {
                    statements.push(match &after.default {
                        Some(default) => format!(
                            "ALTER TABLE {target} ALTER COLUMN {column} SET DEFAULT {default}"
                        ),
                        None => {
                            format!("ALTER TABLE {target} ALTER COLUMN {column} DROP DEFAULT")
                        }
                    });
                }
            }
            statements
        }
        AlterTableOperation::RenameTable => {
            vec![format!(
                "ALTER TABLE {target} RENAME TO {}",
                quote_ident(&new.name)
            )]
        }
    };

    Ok(statements)
}

pub fn drop_table(schema: &str, name: &str) -> String {
    format!("DROP TABLE {}", qualified(schema, name))
}
