//! Raw catalog queries for the Postgres handler.
//!
//! Queries are runtime-bound so the crate builds without a live database;
//! every projected column is cast to a concrete wire type.

use sqlx::PgPool;

use schemagate_core::Result;

use super::utils::map_query_error;

pub async fn server_version(pool: &PgPool) -> Result<String> {
    sqlx::query_scalar::<_, String>("select version()")
        .fetch_one(pool)
        .await
        .map_err(map_query_error)
}

pub async fn list_foreign_servers(pool: &PgPool) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        "select srvname::text from pg_foreign_server order by srvname",
    )
    .fetch_all(pool)
    .await
    .map_err(map_query_error)
}

#[derive(sqlx::FromRow)]
pub struct RawDatabase {
    pub name: String,
    pub owner: Option<String>,
    pub encoding: Option<String>,
    pub collation: Option<String>,
    pub connection_limit: i32,
    pub size_bytes: Option<i64>,
}

const DATABASE_PROJECTION: &str = r#"
    select
      d.datname::text as name,
      pg_get_userbyid(d.datdba)::text as owner,
      pg_encoding_to_char(d.encoding)::text as encoding,
      d.datcollate::text as collation,
      d.datconnlimit as connection_limit,
      case
        when has_database_privilege(d.datname, 'CONNECT') then pg_database_size(d.datname)
      end as size_bytes
    from pg_database d
"#;

pub async fn list_databases(pool: &PgPool) -> Result<Vec<RawDatabase>> {
    let sql = format!("{DATABASE_PROJECTION} where not d.datistemplate order by d.datname");
    sqlx::query_as::<_, RawDatabase>(&sql)
        .fetch_all(pool)
        .await
        .map_err(map_query_error)
}

pub async fn get_database(pool: &PgPool, name: &str) -> Result<Option<RawDatabase>> {
    let sql = format!("{DATABASE_PROJECTION} where d.datname = $1");
    sqlx::query_as::<_, RawDatabase>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(map_query_error)
}

pub async fn database_exists(pool: &PgPool, name: &str) -> Result<bool> {
    sqlx::query_scalar::<_, bool>("select exists (select 1 from pg_database where datname = $1)")
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(map_query_error)
}

#[derive(sqlx::FromRow)]
pub struct RawTable {
    pub schema: String,
    pub name: String,
    pub relkind: String,
}

pub async fn list_tables(pool: &PgPool) -> Result<Vec<RawTable>> {
    sqlx::query_as::<_, RawTable>(
        r#"
        select
          n.nspname::text as schema,
          c.relname::text as name,
          c.relkind::text as relkind
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where c.relkind in ('r', 'p', 'v', 'm', 'f')
          and n.nspname not like 'pg\_%'
          and n.nspname <> 'information_schema'
        order by n.nspname, c.relname
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(map_query_error)
}

pub async fn get_table(pool: &PgPool, schema: &str, name: &str) -> Result<Option<RawTable>> {
    sqlx::query_as::<_, RawTable>(
        r#"
        select
          n.nspname::text as schema,
          c.relname::text as name,
          c.relkind::text as relkind
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relname = $2
          and c.relkind in ('r', 'p', 'v', 'm', 'f')
        "#,
    )
    .bind(schema)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(map_query_error)
}

/// Any relation (table, view, index, …) with this name? `CREATE TABLE`
/// conflicts with all of them.
pub async fn relation_exists(pool: &PgPool, schema: &str, name: &str) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        select exists (
          select 1
          from pg_class c
          join pg_namespace n on n.oid = c.relnamespace
          where n.nspname = $1 and c.relname = $2
        )
        "#,
    )
    .bind(schema)
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(map_query_error)
}

pub async fn table_exists(pool: &PgPool, schema: &str, name: &str) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        select exists (
          select 1
          from pg_class c
          join pg_namespace n on n.oid = c.relnamespace
          where n.nspname = $1 and c.relname = $2 and c.relkind in ('r', 'p')
        )
        "#,
    )
    .bind(schema)
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(map_query_error)
}

#[derive(sqlx::FromRow)]
pub struct RawColumn {
    pub ordinal_position: i16,
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub character_max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub collation: Option<String>,
}

pub async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawColumn>> {
    sqlx::query_as::<_, RawColumn>(
        r#"
        select
          a.attnum as ordinal_position,
          a.attname::text as name,
          pg_catalog.format_type(a.atttypid, a.atttypmod) as data_type,
          (not a.attnotnull) as is_nullable,
          pg_get_expr(ad.adbin, ad.adrelid) as "default",
          ic.character_maximum_length::int4 as character_max_length,
          ic.numeric_precision::int4 as numeric_precision,
          ic.numeric_scale::int4 as numeric_scale,
          ic.collation_name::text as collation
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        left join pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum
        left join information_schema.columns ic
          on ic.table_schema = n.nspname and ic.table_name = c.relname and ic.column_name = a.attname
        where n.nspname = $1
          and c.relname = $2
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(map_query_error)
}

#[derive(sqlx::FromRow)]
pub struct RawPrimaryKey {
    pub name: String,
    pub columns: Vec<String>,
}

pub async fn get_primary_key(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Option<RawPrimaryKey>> {
    sqlx::query_as::<_, RawPrimaryKey>(
        r#"
        select
          con.conname::text as name,
          array_agg(att.attname::text order by ord.ordinality) as columns
        from pg_constraint con
        join pg_class rel on rel.oid = con.conrelid
        join pg_namespace nsp on nsp.oid = rel.relnamespace
        join unnest(con.conkey) with ordinality as ord(attnum, ordinality) on true
        join pg_attribute att on att.attrelid = rel.oid and att.attnum = ord.attnum
        where nsp.nspname = $1
          and rel.relname = $2
          and con.contype = 'p'
        group by con.conname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_optional(pool)
    .await
    .map_err(map_query_error)
}

#[derive(sqlx::FromRow)]
pub struct RawRoutine {
    pub schema: String,
    pub name: String,
    pub kind_code: String,
    pub language: String,
    pub arguments: String,
    pub return_type: Option<String>,
    pub definition: String,
}

const ROUTINE_PROJECTION: &str = r#"
    select
      n.nspname::text as schema,
      p.proname::text as name,
      p.prokind::text as kind_code,
      l.lanname::text as language,
      pg_get_function_arguments(p.oid) as arguments,
      case when p.prokind = 'f' then pg_get_function_result(p.oid) end as return_type,
      pg_get_functiondef(p.oid) as definition
    from pg_proc p
    join pg_namespace n on n.oid = p.pronamespace
    join pg_language l on l.oid = p.prolang
    where p.prokind in ('f', 'p')
      and l.lanname not in ('internal', 'c')
"#;

pub async fn list_routines(pool: &PgPool) -> Result<Vec<RawRoutine>> {
    let sql = format!(
        r#"{ROUTINE_PROJECTION}
          and n.nspname not like 'pg\_%'
          and n.nspname <> 'information_schema'
        order by n.nspname, p.proname"#
    );
    sqlx::query_as::<_, RawRoutine>(&sql)
        .fetch_all(pool)
        .await
        .map_err(map_query_error)
}

/// First overload wins when a routine name is overloaded.
pub async fn get_routine(pool: &PgPool, schema: &str, name: &str) -> Result<Option<RawRoutine>> {
    let sql = format!(
        "{ROUTINE_PROJECTION} and n.nspname = $1 and p.proname = $2 order by p.oid limit 1"
    );
    sqlx::query_as::<_, RawRoutine>(&sql)
        .bind(schema)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(map_query_error)
}

#[derive(sqlx::FromRow)]
pub struct RawTrigger {
    pub schema: String,
    pub table_name: String,
    pub name: String,
    pub type_bits: i16,
    pub function: String,
    pub enabled: bool,
    pub definition: String,
}

const TRIGGER_PROJECTION: &str = r#"
    select
      n.nspname::text as schema,
      c.relname::text as table_name,
      t.tgname::text as name,
      t.tgtype as type_bits,
      p.proname::text as function,
      (t.tgenabled <> 'D') as enabled,
      pg_get_triggerdef(t.oid) as definition
    from pg_trigger t
    join pg_class c on c.oid = t.tgrelid
    join pg_namespace n on n.oid = c.relnamespace
    join pg_proc p on p.oid = t.tgfoid
    where not t.tgisinternal
"#;

pub async fn list_triggers(pool: &PgPool) -> Result<Vec<RawTrigger>> {
    let sql = format!(
        r#"{TRIGGER_PROJECTION}
          and n.nspname not like 'pg\_%'
          and n.nspname <> 'information_schema'
        order by n.nspname, c.relname, t.tgname"#
    );
    sqlx::query_as::<_, RawTrigger>(&sql)
        .fetch_all(pool)
        .await
        .map_err(map_query_error)
}

pub async fn get_trigger(pool: &PgPool, schema: &str, name: &str) -> Result<Option<RawTrigger>> {
    let sql = format!("{TRIGGER_PROJECTION} and n.nspname = $1 and t.tgname = $2 limit 1");
    sqlx::query_as::<_, RawTrigger>(&sql)
        .bind(schema)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(map_query_error)
}

#[derive(sqlx::FromRow)]
pub struct RawTableType {
    pub id: i32,
    pub schema: String,
    pub name: String,
}

const TABLE_TYPE_PROJECTION: &str = r#"
    select
      t.oid::int4 as id,
      n.nspname::text as schema,
      t.typname::text as name
    from pg_type t
    join pg_namespace n on n.oid = t.typnamespace
    join pg_class c on c.oid = t.typrelid
    where t.typtype = 'c'
      and c.relkind = 'c'
"#;

pub async fn list_table_types(pool: &PgPool) -> Result<Vec<RawTableType>> {
    let sql = format!(
        r#"{TABLE_TYPE_PROJECTION}
          and n.nspname not like 'pg\_%'
          and n.nspname <> 'information_schema'
        order by n.nspname, t.typname"#
    );
    sqlx::query_as::<_, RawTableType>(&sql)
        .fetch_all(pool)
        .await
        .map_err(map_query_error)
}

pub async fn get_table_type(
    pool: &PgPool,
    schema: &str,
    name: &str,
) -> Result<Option<RawTableType>> {
    let sql = format!("{TABLE_TYPE_PROJECTION} and n.nspname = $1 and t.typname = $2");
    sqlx::query_as::<_, RawTableType>(&sql)
        .bind(schema)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(map_query_error)
}

#[derive(sqlx::FromRow)]
pub struct RawTableTypeColumn {
    pub column_id: i32,
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub collation: Option<String>,
}

pub async fn list_table_type_columns(
    pool: &PgPool,
    schema: &str,
    name: &str,
) -> Result<Vec<RawTableTypeColumn>> {
    sqlx::query_as::<_, RawTableTypeColumn>(
        r#"
        select
          a.ordinal_position::int4 as column_id,
          a.attribute_name::text as name,
          a.data_type::text as data_type,
          (a.is_nullable = 'YES') as is_nullable,
          a.character_maximum_length::int4 as length,
          a.numeric_precision::int4 as "precision",
          a.numeric_scale::int4 as scale,
          a.collation_name::text as collation
        from information_schema.attributes a
        where a.udt_schema = $1
          and a.udt_name = $2
        order by a.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(name)
    .fetch_all(pool)
    .await
    .map_err(map_query_error)
}

/// Execute a single DDL statement, mapping conflicts by server error code.
pub async fn execute_ddl(pool: &PgPool, sql: &str) -> Result<()> {
    sqlx::query(sql)
        .execute(pool)
        .await
        .map_err(super::utils::map_ddl_error)?;
    Ok(())
}
