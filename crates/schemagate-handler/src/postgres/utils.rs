use schemagate_core::{Error, RoutineKind, TableKind, TriggerEvent, TriggerTiming};

// Bit layout of pg_trigger.tgtype, from the server's pg_trigger.h.
const TRIGGER_TYPE_ROW: i16 = 1 << 0;
const TRIGGER_TYPE_BEFORE: i16 = 1 << 1;
const TRIGGER_TYPE_INSERT: i16 = 1 << 2;
const TRIGGER_TYPE_DELETE: i16 = 1 << 3;
const TRIGGER_TYPE_UPDATE: i16 = 1 << 4;
const TRIGGER_TYPE_TRUNCATE: i16 = 1 << 5;
const TRIGGER_TYPE_INSTEAD: i16 = 1 << 6;

/// Convert Postgres `relkind` code to a typed table kind.
pub fn relkind_to_table_kind(code: &str) -> TableKind {
    match code {
        "r" => TableKind::Table,
        "p" => TableKind::PartitionedTable,
        "v" => TableKind::View,
        "m" => TableKind::MaterializedView,
        "f" => TableKind::ForeignTable,
        other => TableKind::Other(other.to_string()),
    }
}

/// Convert Postgres `prokind` code to a routine kind.
pub fn routine_kind_from_code(code: &str) -> RoutineKind {
    match code {
        "p" => RoutineKind::Procedure,
        _ => RoutineKind::Function,
    }
}

/// Decode trigger timing from `pg_trigger.tgtype` bits.
pub fn trigger_timing_from_bits(bits: i16) -> TriggerTiming {
    if bits & TRIGGER_TYPE_INSTEAD != 0 {
        TriggerTiming::InsteadOf
    } else if bits & TRIGGER_TYPE_BEFORE != 0 {
        TriggerTiming::Before
    } else {
        TriggerTiming::After
    }
}

/// Decode the firing events from `pg_trigger.tgtype` bits, in catalog order.
pub fn trigger_events_from_bits(bits: i16) -> Vec<TriggerEvent> {
    let mut events = Vec::new();
    if bits & TRIGGER_TYPE_INSERT != 0 {
        events.push(TriggerEvent::Insert);
    }
    if bits & TRIGGER_TYPE_DELETE != 0 {
        events.push(TriggerEvent::Delete);
    }
    if bits & TRIGGER_TYPE_UPDATE != 0 {
        events.push(TriggerEvent::Update);
    }
    if bits & TRIGGER_TYPE_TRUNCATE != 0 {
        events.push(TriggerEvent::Truncate);
    }
    events
}

/// Whether the trigger fires per row rather than per statement.
pub fn for_each_row_from_bits(bits: i16) -> bool {
    bits & TRIGGER_TYPE_ROW != 0
}

/// Map a driver error on a DDL statement to the gateway taxonomy, using the
/// server error code as a backstop for precondition races.
pub fn map_ddl_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code() {
            match code.as_ref() {
                // duplicate_database, duplicate_schema, duplicate_table, duplicate_object
                "42P04" | "42P06" | "42P07" | "42710" => {
                    return Error::DdlConflict(db_err.to_string());
                }
                // invalid_catalog_name, undefined_table, dependent_objects_still_exist,
                // object_in_use
                "3D000" | "42P01" | "2BP01" | "55006" => {
                    return Error::DdlConflict(db_err.to_string());
                }
                _ => {}
            }
        }
    }
    map_query_error(err)
}

/// Map a driver error on a read to the gateway taxonomy: transport failures
/// are connectivity problems, everything else is a database error.
pub fn map_query_error(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
            Error::Connectivity(err.to_string())
        }
        _ => Error::Db(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_trigger_type_bits() {
        // BEFORE INSERT OR UPDATE ... FOR EACH ROW
        let bits = TRIGGER_TYPE_ROW | TRIGGER_TYPE_BEFORE | TRIGGER_TYPE_INSERT | TRIGGER_TYPE_UPDATE;
        assert_eq!(trigger_timing_from_bits(bits), TriggerTiming::Before);
        assert_eq!(
            trigger_events_from_bits(bits),
            vec![TriggerEvent::Insert, TriggerEvent::Update]
        );
        assert!(for_each_row_from_bits(bits));

        // AFTER TRUNCATE ... FOR EACH STATEMENT
        let bits = TRIGGER_TYPE_TRUNCATE;
        assert_eq!(trigger_timing_from_bits(bits), TriggerTiming::After);
        assert_eq!(trigger_events_from_bits(bits), vec![TriggerEvent::Truncate]);
        assert!(!for_each_row_from_bits(bits));

        let bits = TRIGGER_TYPE_ROW | TRIGGER_TYPE_INSTEAD | TRIGGER_TYPE_DELETE;
        assert_eq!(trigger_timing_from_bits(bits), TriggerTiming::InsteadOf);
    }

    #[test]
    fn maps_relkind_codes() {
        assert_eq!(relkind_to_table_kind("r"), TableKind::Table);
        assert_eq!(relkind_to_table_kind("m"), TableKind::MaterializedView);
        assert_eq!(
            relkind_to_table_kind("S"),
            TableKind::Other("S".to_string())
        );
    }
}
