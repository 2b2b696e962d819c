use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::TableDefinition;
use crate::table_type::TableTypeDefinition;

/// Validate internal consistency of a table definition.
///
/// This checks:
/// - non-empty table and column names
/// - duplicate column names
/// - primary key columns exist
///
/// Validation is explicit: definitions are plain data and nothing runs on
/// construction.
pub fn validate_table(table: &TableDefinition) -> Result<()> {
    if table.name.is_empty() {
        return Err(Error::InvalidDefinition("table name is empty".to_string()));
    }

    let mut columns = BTreeSet::new();
    for column in &table.columns {
        if column.name.is_empty() {
            return Err(Error::InvalidDefinition(format!(
                "column without a name in table {}",
                table.name
            )));
        }
        if !columns.insert(column.name.as_str()) {
            return Err(Error::InvalidDefinition(format!(
                "duplicate column name: {}.{}",
                table.name, column.name
            )));
        }
    }

    if let Some(primary_key) = &table.primary_key {
        for column in &primary_key.columns {
            if !columns.contains(column.as_str()) {
                return Err(Error::InvalidDefinition(format!(
                    "primary key column not found: {}.{}",
                    table.name, column
                )));
            }
        }
    }

    Ok(())
}

/// Validate internal consistency of a user-defined table type.
///
/// This checks:
/// - non-empty type and column names
/// - duplicate column ids
/// - duplicate column names
pub fn validate_table_type(table_type: &TableTypeDefinition) -> Result<()> {
    if table_type.name.is_empty() {
        return Err(Error::InvalidDefinition(
            "table type name is empty".to_string(),
        ));
    }

    let mut ids = BTreeSet::new();
    let mut names = BTreeSet::new();
    for column in &table_type.columns {
        if column.name.is_empty() {
            return Err(Error::InvalidDefinition(format!(
                "column without a name in table type {}",
                table_type.name
            )));
        }
        if !ids.insert(column.column_id) {
            return Err(Error::InvalidDefinition(format!(
                "duplicate column id {} in table type {}",
                column.column_id, table_type.name
            )));
        }
        if !names.insert(column.name.as_str()) {
            return Err(Error::InvalidDefinition(format!(
                "duplicate column name: {}.{}",
                table_type.name, column.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnDefinition, PrimaryKeyDefinition, TableKind};
    use crate::table_type::TableTypeColumn;

    fn column(ordinal: i16, name: &str) -> ColumnDefinition {
        ColumnDefinition {
            ordinal_position: ordinal,
            name: name.to_string(),
            data_type: "text".to_string(),
            is_nullable: true,
            default: None,
            character_max_length: None,
            numeric_precision: None,
            numeric_scale: None,
            collation: None,
        }
    }

    fn table(columns: Vec<ColumnDefinition>) -> TableDefinition {
        TableDefinition {
            schema: "public".to_string(),
            name: "users".to_string(),
            kind: TableKind::Table,
            columns,
            primary_key: None,
        }
    }

    #[test]
    fn accepts_well_formed_table() {
        let mut def = table(vec![column(1, "id"), column(2, "email")]);
        def.primary_key = Some(PrimaryKeyDefinition {
            name: None,
            columns: vec!["id".to_string()],
        });
        assert!(validate_table(&def).is_ok());
    }

    #[test]
    fn rejects_duplicate_column_names() {
        let def = table(vec![column(1, "id"), column(2, "id")]);
        let err = validate_table(&def).unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition(_)));
    }

    #[test]
    fn rejects_primary_key_over_missing_column() {
        let mut def = table(vec![column(1, "id")]);
        def.primary_key = Some(PrimaryKeyDefinition {
            name: None,
            columns: vec!["missing".to_string()],
        });
        let err = validate_table(&def).unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition(_)));
    }

    #[test]
    fn rejects_duplicate_table_type_column_ids() {
        let col = |id: i32, name: &str| TableTypeColumn {
            column_id: id,
            name: name.to_string(),
            data_type: "int".to_string(),
            is_nullable: false,
            length: None,
            precision: None,
            scale: None,
            collation: None,
        };
        let def = TableTypeDefinition {
            id: 1,
            name: "pair".to_string(),
            columns: vec![col(1, "a"), col(1, "b")],
        };
        let err = validate_table_type(&def).unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition(_)));
    }

    #[test]
    fn accepts_zero_column_table_type() {
        let def = TableTypeDefinition {
            id: 1,
            name: "empty".to_string(),
            columns: Vec::new(),
        };
        assert!(validate_table_type(&def).is_ok());
    }
}
