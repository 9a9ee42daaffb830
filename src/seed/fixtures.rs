use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::{Record, SeedTable};
use crate::seed::error::SeedError;

/// Rows for every seeded table, as read from the fixture directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureSet {
    tables: BTreeMap<SeedTable, Vec<Record>>,
}

impl FixtureSet {
    /// Read all eight fixture files. Any missing or malformed file fails the
    /// whole load.
    pub async fn load(dir: &Path) -> Result<Self, SeedError> {
        let mut tables = BTreeMap::new();
        for table in SeedTable::ALL {
            let path = dir.join(table.fixture_file());
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| SeedError::FixtureRead {
                    path: path.clone(),
                    source,
                })?;
            let rows = parse_fixture(&path, &contents)?;
            log::debug!("Loaded {} rows from {}", rows.len(), path.display());
            tables.insert(table, rows);
        }
        Ok(Self { tables })
    }

    pub fn rows(&self, table: SeedTable) -> &[Record] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_rows(&mut self, table: SeedTable, rows: Vec<Record>) {
        self.tables.insert(table, rows);
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Records whose dates feed delta inference and get shifted
    pub fn dated_rows(&self) -> impl Iterator<Item = &Record> {
        SeedTable::ALL
            .into_iter()
            .filter(SeedTable::is_date_shifted)
            .flat_map(move |table| self.rows(table).iter())
    }
}

/// Parse one fixture file's contents into records.
pub fn parse_fixture(path: &Path, contents: &str) -> Result<Vec<Record>, SeedError> {
    let value: Value = serde_json::from_str(contents).map_err(|source| SeedError::FixtureParse {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Array(items) = value else {
        return Err(shape_error(path, "top-level value is not an array".to_string()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(shape_error(
                path,
                format!("element {} is {}", idx, kind_of(&other)),
            )),
        })
        .collect()
}

fn shape_error(path: &Path, detail: String) -> SeedError {
    SeedError::FixtureShape {
        path: PathBuf::from(path),
        detail,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
