use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::SeedTable;

/// Caller-supplied knobs for a reseed run. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReseedOptions {
    /// Fixture directory; falls back to the configured `seed.seed_dir`
    #[serde(default)]
    pub seed_dir: Option<PathBuf>,
    /// Explicit shift in days. `Some(0)` means "do not shift", `None` means "infer"
    #[serde(default)]
    pub delta_days: Option<i64>,
    /// Where the earliest fixture date should land, counted back from today
    #[serde(default)]
    pub anchor_days_ago: Option<i64>,
}

impl ReseedOptions {
    pub fn with_delta_days(mut self, delta_days: i64) -> Self {
        self.delta_days = Some(delta_days);
        self
    }

    pub fn with_anchor_days_ago(mut self, anchor_days_ago: i64) -> Self {
        self.anchor_days_ago = Some(anchor_days_ago);
        self
    }

    pub fn with_seed_dir(mut self, seed_dir: impl Into<PathBuf>) -> Self {
        self.seed_dir = Some(seed_dir.into());
        self
    }
}

/// What a completed reseed applied
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReseedOutcome {
    pub delta_days: i64,
    pub inserted: Vec<(SeedTable, usize)>,
}

impl ReseedOutcome {
    pub fn total_inserted(&self) -> usize {
        self.inserted.iter().map(|(_, count)| count).sum()
    }
}
