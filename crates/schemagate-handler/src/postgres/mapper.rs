use schemagate_core::{
    ColumnDefinition, DatabaseDefinition, PrimaryKeyDefinition, StoredProcedureDefinition,
    TableDefinition, TableTypeColumn, TableTypeDefinition, TriggerDefinition,
};

use super::queries::{
    RawColumn, RawDatabase, RawPrimaryKey, RawRoutine, RawTable, RawTableType,
    RawTableTypeColumn, RawTrigger,
};
use super::utils::{
    for_each_row_from_bits, relkind_to_table_kind, routine_kind_from_code,
    trigger_events_from_bits, trigger_timing_from_bits,
};

pub fn map_database(raw: RawDatabase) -> DatabaseDefinition {
    DatabaseDefinition {
        name: raw.name,
        owner: raw.owner,
        encoding: raw.encoding,
        collation: raw.collation,
        // -1 in the catalog means unlimited.
        connection_limit: (raw.connection_limit >= 0).then_some(raw.connection_limit),
        size_bytes: raw.size_bytes,
    }
}

pub fn map_table(raw: RawTable, columns: Vec<RawColumn>, pk: Option<RawPrimaryKey>) -> TableDefinition {
    TableDefinition {
        schema: raw.schema,
        name: raw.name,
        kind: relkind_to_table_kind(&raw.relkind),
        columns: columns.into_iter().map(map_column).collect(),
        primary_key: pk.map(|pk| PrimaryKeyDefinition {
            name: Some(pk.name),
            columns: pk.columns,
        }),
    }
}

pub fn map_column(raw: RawColumn) -> ColumnDefinition {
    ColumnDefinition {
        ordinal_position: raw.ordinal_position,
        name: raw.name,
        data_type: raw.data_type,
        is_nullable: raw.is_nullable,
        default: raw.default,
        character_max_length: raw.character_max_length,
        numeric_precision: raw.numeric_precision,
        numeric_scale: raw.numeric_scale,
        collation: raw.collation,
    }
}

pub fn map_routine(raw: RawRoutine) -> StoredProcedureDefinition {
    StoredProcedureDefinition {
        schema: raw.schema,
        name: raw.name,
        kind: routine_kind_from_code(&raw.kind_code),
        language: raw.language,
        arguments: raw.arguments,
        return_type: raw.return_type,
        definition: raw.definition,
    }
}

pub fn map_trigger(raw: RawTrigger) -> TriggerDefinition {
    TriggerDefinition {
        schema: raw.schema,
        table: raw.table_name,
        name: raw.name,
        timing: trigger_timing_from_bits(raw.type_bits),
        events: trigger_events_from_bits(raw.type_bits),
        for_each_row: for_each_row_from_bits(raw.type_bits),
        function: raw.function,
        enabled: raw.enabled,
        definition: raw.definition,
    }
}

pub fn map_table_type(raw: RawTableType, columns: Vec<RawTableTypeColumn>) -> TableTypeDefinition {
    TableTypeDefinition {
        id: raw.id,
        name: raw.name,
        columns: columns.into_iter().map(map_table_type_column).collect(),
    }
}

pub fn map_table_type_column(raw: RawTableTypeColumn) -> TableTypeColumn {
    TableTypeColumn {
        column_id: raw.column_id,
        name: raw.name,
        data_type: raw.data_type,
        is_nullable: raw.is_nullable,
        length: raw.length,
        precision: raw.precision,
        scale: raw.scale,
        collation: raw.collation,
    }
}
