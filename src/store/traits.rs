use anyhow::Result;

use crate::model::{Record, SeedTable};

/// Destination of a reseed run. The orchestrator receives one explicitly
/// instead of reaching for a global client.
#[async_trait::async_trait]
pub trait SeedStore: Send + Sync {
    /// Empty the given tables and reset their identity counters.
    async fn truncate_all(&self, tables: &[SeedTable]) -> Result<()>;

    /// Insert one fixture row. Columns missing from the record take their
    /// defaults, so tables with serial keys number rows from 1.
    async fn insert_record(&self, table: SeedTable, record: &Record) -> Result<()>;

    /// Called once a table's rows are all in. Stores whose keys come from
    /// sequences move them past the highest inserted key.
    async fn sync_identity(&self, _table: SeedTable) -> Result<()> {
        Ok(())
    }

    /// Number of rows currently in the table
    async fn count_rows(&self, table: SeedTable) -> Result<i64>;
}
