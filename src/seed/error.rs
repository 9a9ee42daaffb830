use std::path::PathBuf;
use thiserror::Error;

use crate::model::SeedTable;
use crate::seed::dates::ShiftOutOfRange;

/// Everything that can stop a reseed run. Unparseable dates are not here:
/// they are left as-is and the run continues.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read fixture {}: {source}", path.display())]
    FixtureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in fixture {}: {source}", path.display())]
    FixtureParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("fixture {} must be a JSON array of objects ({detail})", path.display())]
    FixtureShape { path: PathBuf, detail: String },

    #[error("anchorDaysAgo {0} puts the anchor outside the supported calendar range")]
    AnchorOutOfRange(i64),

    #[error(transparent)]
    ShiftOutOfRange(#[from] ShiftOutOfRange),

    #[error("{0:#}")]
    Truncate(anyhow::Error),

    #[error("failed to seed table {table}: {cause:#}")]
    Insert {
        table: SeedTable,
        cause: anyhow::Error,
    },
}

impl SeedError {
    /// Whether the store may have been modified before the failure
    pub fn touched_store(&self) -> bool {
        matches!(self, SeedError::Truncate(_) | SeedError::Insert { .. })
    }

    /// Table that failed during insertion, if any
    pub fn failed_table(&self) -> Option<SeedTable> {
        match self {
            SeedError::Insert { table, .. } => Some(*table),
            _ => None,
        }
    }
}
