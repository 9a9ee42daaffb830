use anyhow::{Context, Result};
use itertools::Itertools;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::model::{Record, SeedTable};
use crate::store::traits::SeedStore;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }
}

/// Double-quote an identifier, escaping embedded quotes
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `TRUNCATE` statement for the given tables
pub fn truncate_sql(tables: &[SeedTable]) -> String {
    format!(
        "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
        tables.iter().map(SeedTable::table_name).join(", ")
    )
}

/// Insert statement for one record. Postgres coerces the JSON fields into the
/// table's column types through `jsonb_populate_record`; columns the record
/// does not mention are left to their defaults.
pub fn insert_sql(table: SeedTable, record: &Record) -> String {
    let table_name = table.table_name();
    if record.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", table_name);
    }

    let columns = record.keys().map(|key| quote_ident(key)).join(", ");
    format!(
        "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1)",
        table = table_name,
        columns = columns,
    )
}

/// Move a table's serial sequence past the highest key, so rows inserted
/// with explicit ids do not collide with later application inserts.
pub fn sync_identity_sql(table: SeedTable) -> String {
    let table_name = table.table_name();
    let key = quote_ident(table.primary_key());
    format!(
        "SELECT setval(pg_get_serial_sequence('{table}', '{key_raw}'), COALESCE(MAX({key}), 1), MAX({key}) IS NOT NULL) FROM {table}",
        table = table_name,
        key_raw = table.primary_key(),
        key = key,
    )
}

#[async_trait::async_trait]
impl SeedStore for PostgresStore {
    async fn truncate_all(&self, tables: &[SeedTable]) -> Result<()> {
        sqlx::query(&truncate_sql(tables))
            .execute(&self.pool)
            .await
            .context("Failed to truncate seed tables")?;

        Ok(())
    }

    async fn insert_record(&self, table: SeedTable, record: &Record) -> Result<()> {
        let sql = insert_sql(table, record);
        let query = sqlx::query(&sql);
        let query = if record.is_empty() {
            query
        } else {
            query.bind(Value::Object(record.clone()))
        };

        query
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert row into {}", table))?;

        Ok(())
    }

    async fn sync_identity(&self, table: SeedTable) -> Result<()> {
        sqlx::query(&sync_identity_sql(table))
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to reset identity sequence of {}", table))?;

        Ok(())
    }

    async fn count_rows(&self, table: SeedTable) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table.table_name()))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count rows in {}", table))?;

        Ok(count)
    }
}
