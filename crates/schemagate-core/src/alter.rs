use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Operation a caller asks the handler to apply when altering a table.
///
/// The caller computes the difference between the old and new definitions and
/// names the intended operation; the handler validates that the operation is
/// consistent with the pair and applies exactly that operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlterTableOperation {
    /// Add the columns present in the new definition but not in the old one.
    AddColumns,
    /// Drop the columns present in the old definition but not in the new one.
    DropColumns,
    /// Change type, nullability, or default of columns present in both.
    AlterColumns,
    /// Rename the table from the old definition's name to the new one's.
    RenameTable,
}

impl fmt::Display for AlterTableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlterTableOperation::AddColumns => "add_columns",
            AlterTableOperation::DropColumns => "drop_columns",
            AlterTableOperation::AlterColumns => "alter_columns",
            AlterTableOperation::RenameTable => "rename_table",
        };
        f.write_str(label)
    }
}
