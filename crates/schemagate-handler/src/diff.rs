//! Column-level comparison between two table definitions.
//!
//! Alter-table callers compute the diff and name the intended operation;
//! these helpers classify the difference and check that the named operation
//! is consistent with it.

use schemagate_core::{AlterTableOperation, ColumnDefinition, Error, Result, TableDefinition};

/// Columns present in `new` but absent from `old`, by name.
pub fn added_columns<'a>(
    old: &TableDefinition,
    new: &'a TableDefinition,
) -> Vec<&'a ColumnDefinition> {
    new.columns
        .iter()
        .filter(|column| find_column(old, &column.name).is_none())
        .collect()
}

/// Columns present in `old` but absent from `new`, by name.
pub fn dropped_columns<'a>(
    old: &'a TableDefinition,
    new: &TableDefinition,
) -> Vec<&'a ColumnDefinition> {
    old.columns
        .iter()
        .filter(|column| find_column(new, &column.name).is_none())
        .collect()
}

/// Column pairs present in both definitions whose type, nullability, or
/// default differ. Ordinal position is ignored; physical reordering is not
/// an alterable property.
pub fn changed_columns<'a>(
    old: &'a TableDefinition,
    new: &'a TableDefinition,
) -> Vec<(&'a ColumnDefinition, &'a ColumnDefinition)> {
    old.columns
        .iter()
        .filter_map(|before| {
            let after = find_column(new, &before.name)?;
            let changed = before.data_type != after.data_type
                || before.is_nullable != after.is_nullable
                || before.default != after.default;
            changed.then_some((before, after))
        })
        .collect()
}

/// Check that the named operation is consistent with the old/new pair.
///
/// An inconsistent operation (e.g. `AddColumns` when no column was added) is
/// a [`Error::DdlConflict`]; callers reject it before any statement runs.
pub fn validate_operation(
    old: &TableDefinition,
    new: &TableDefinition,
    operation: &AlterTableOperation,
) -> Result<()> {
    match operation {
        AlterTableOperation::AddColumns => {
            if added_columns(old, new).is_empty() {
                return Err(inconsistent(operation, "no columns were added"));
            }
        }
        AlterTableOperation::DropColumns => {
            if dropped_columns(old, new).is_empty() {
                return Err(inconsistent(operation, "no columns were dropped"));
            }
        }
        AlterTableOperation::AlterColumns => {
            if changed_columns(old, new).is_empty() {
                return Err(inconsistent(operation, "no columns were changed"));
            }
        }
        AlterTableOperation::RenameTable => {
            if old.name == new.name {
                return Err(inconsistent(operation, "old and new names are identical"));
            }
            if old.schema != new.schema {
                return Err(inconsistent(operation, "rename cannot move schemas"));
            }
        }
    }
    Ok(())
}

fn inconsistent(operation: &AlterTableOperation, reason: &str) -> Error {
    Error::DdlConflict(format!(
        "{operation} is inconsistent with the given definitions: {reason}"
    ))
}

fn find_column<'a>(table: &'a TableDefinition, name: &str) -> Option<&'a ColumnDefinition> {
    table.columns.iter().find(|column| column.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemagate_core::TableKind;

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

    fn table(name: &str, columns: Vec<ColumnDefinition>) -> TableDefinition {
        TableDefinition {
            schema: "public".to_string(),
            name: name.to_string(),
            kind: TableKind::Table,
            columns,
            primary_key: None,
        }
    }

    #[test]
    fn classifies_added_and_dropped_columns() {
        let old = table("t", vec![column(1, "id", "bigint"), column(2, "gone", "text")]);
        let new = table("t", vec![column(1, "id", "bigint"), column(2, "fresh", "text")]);

        let added: Vec<_> = added_columns(&old, &new)
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(added, vec!["fresh"]);

        let dropped: Vec<_> = dropped_columns(&old, &new)
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(dropped, vec!["gone"]);
    }

    #[test]
    fn classifies_changed_columns_ignoring_ordinals() {
        let old = table("t", vec![column(1, "id", "integer")]);
        let mut new = table("t", vec![column(5, "id", "bigint")]);
        new.columns[0].is_nullable = false;

        let changed = changed_columns(&old, &new);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].1.data_type, "bigint");

        // Same content at a different ordinal is not a change.
        let reordered = table("t", vec![column(9, "id", "integer")]);
        assert!(changed_columns(&old, &reordered).is_empty());
    }

    #[test]
    fn rejects_inconsistent_operations() {
        let old = table("t", vec![column(1, "id", "bigint")]);
        let same = table("t", vec![column(1, "id", "bigint")]);

        for operation in [
            AlterTableOperation::AddColumns,
            AlterTableOperation::DropColumns,
            AlterTableOperation::AlterColumns,
            AlterTableOperation::RenameTable,
        ] {
            let err = validate_operation(&old, &same, &operation).unwrap_err();
            assert!(matches!(err, Error::DdlConflict(_)), "{operation} passed");
        }
    }

    #[test]
    fn accepts_consistent_rename() {
        let old = table("t", vec![column(1, "id", "bigint")]);
        let new = table("t2", vec![column(1, "id", "bigint")]);
        assert!(validate_operation(&old, &new, &AlterTableOperation::RenameTable).is_ok());
    }
}
