use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A user-defined table type: identity plus ordered column definitions.
///
/// Equality is structural: two definitions are equal when id, name, and the
/// full column sequence match. Downstream DDL generation compares definitions
/// to detect alterations, so reference identity would be useless here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct TableTypeDefinition {
    pub id: i32,
    pub name: String,
    /// Columns in physical order. Ids are unique within a type.
    pub columns: Vec<TableTypeColumn>,
}

/// Column of a user-defined table type.
///
/// Facets are meaningful only for the data types that use them: `length` for
/// string and binary types, `precision`/`scale` for decimal types. Nothing is
/// validated on construction; see [`crate::validation::validate_table_type`]
/// for the explicit check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct TableTypeColumn {
    pub column_id: i32,
    pub name: String,
    /// Declared, dialect-specific data type name.
    pub data_type: String,
    pub is_nullable: bool,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub collation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_column_definition_is_constructible_and_equal() {
        let left = TableTypeDefinition {
            id: 7,
            name: "empty_type".to_string(),
            columns: Vec::new(),
        };
        let right = left.clone();
        assert_eq!(left, right);
    }

    #[test]
    fn equality_is_structural() {
        let column = TableTypeColumn {
            column_id: 1,
            name: "amount".to_string(),
            data_type: "numeric".to_string(),
            is_nullable: false,
            length: None,
            precision: Some(12),
            scale: Some(2),
            collation: None,
        };
        let left = TableTypeDefinition {
            id: 1,
            name: "money_rows".to_string(),
            columns: vec![column.clone()],
        };
        let mut right = left.clone();
        assert_eq!(left, right);

        right.columns[0].scale = Some(4);
        assert_ne!(left, right);
    }
}
