use anyhow::{bail, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::{record_i64, Record, SeedTable};
use crate::store::traits::SeedStore;

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<SeedTable, Vec<Record>>,
    /// Next value handed out for rows that omit their primary key
    sequences: BTreeMap<SeedTable, i64>,
    /// Every successful insert, in call order
    insert_log: Vec<SeedTable>,
    truncations: usize,
    fail_truncate: bool,
    fail_insert_into: Option<SeedTable>,
}

impl MemoryState {
    fn contains_key(&self, table: SeedTable, key: i64) -> bool {
        self.tables.get(&table).is_some_and(|rows| {
            rows.iter()
                .any(|row| record_i64(row, table.primary_key()) == Some(key))
        })
    }
}

/// In-process store with Postgres-like key behaviour: serial primary keys,
/// unique keys, foreign keys checked on insert, sequences that explicit ids
/// do not advance. Used for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next truncation fail
    pub fn fail_truncate(&self) {
        self.state.lock().fail_truncate = true;
    }

    /// Make every insert into `table` fail
    pub fn fail_insert_into(&self, table: SeedTable) {
        self.state.lock().fail_insert_into = Some(table);
    }

    pub fn rows(&self, table: SeedTable) -> Vec<Record> {
        self.state
            .lock()
            .tables
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn insert_log(&self) -> Vec<SeedTable> {
        self.state.lock().insert_log.clone()
    }

    pub fn truncations(&self) -> usize {
        self.state.lock().truncations
    }
}

#[async_trait::async_trait]
impl SeedStore for MemoryStore {
    async fn truncate_all(&self, tables: &[SeedTable]) -> Result<()> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_truncate) {
            bail!("could not obtain lock on relation \"Team\"");
        }

        for table in tables {
            state.tables.remove(table);
            state.sequences.remove(table);
        }
        state.truncations += 1;
        Ok(())
    }

    async fn insert_record(&self, table: SeedTable, record: &Record) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_insert_into == Some(table) {
            bail!("insert into {} rejected", table);
        }

        let primary_key = table.primary_key();
        let mut row = record.clone();
        let key = match record_i64(record, primary_key) {
            Some(key) => key,
            None => {
                let next = state.sequences.entry(table).or_insert(1);
                let key = *next;
                *next += 1;
                row.insert(primary_key.to_string(), Value::from(key));
                key
            }
        };

        if state.contains_key(table, key) {
            bail!(
                "duplicate key value violates unique constraint \"{}_pkey\": Key ({})=({}) already exists",
                table,
                primary_key,
                key
            );
        }

        for (column, parent) in table.foreign_keys() {
            if let Some(parent_key) = record_i64(record, column) {
                if !state.contains_key(*parent, parent_key) {
                    bail!(
                        "insert or update on table \"{}\" violates foreign key constraint on \"{}\": Key ({})=({}) is not present in table \"{}\"",
                        table,
                        column,
                        column,
                        parent_key,
                        parent
                    );
                }
            }
        }

        state.tables.entry(table).or_default().push(row);
        state.insert_log.push(table);
        Ok(())
    }

    async fn sync_identity(&self, table: SeedTable) -> Result<()> {
        let mut state = self.state.lock();
        let max_key = state
            .tables
            .get(&table)
            .into_iter()
            .flatten()
            .filter_map(|row| record_i64(row, table.primary_key()))
            .max();
        if let Some(max_key) = max_key {
            state.sequences.insert(table, max_key + 1);
        }
        Ok(())
    }

    async fn count_rows(&self, table: SeedTable) -> Result<i64> {
        let state = self.state.lock();
        Ok(state.tables.get(&table).map_or(0, |rows| rows.len() as i64))
    }
}
