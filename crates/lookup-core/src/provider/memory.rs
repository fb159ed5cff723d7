//! In-memory query provider.

use crate::error::{LookupError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::query::{attribute_text, key_text};
use super::{ContainsFilter, Entry, QueryProvider};

/// Rows of one in-memory source, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    key_columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl MemoryTable {
    /// Create an empty table keyed by `key_columns`.
    pub fn new<I, S>(key_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_columns: key_columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Every key column must be present and non-null.
    pub fn insert(&mut self, row: Map<String, Value>) -> Result<()> {
        if let Some(missing) = self
            .key_columns
            .iter()
            .find(|c| row.get(*c).map_or(true, Value::is_null))
        {
            return Err(LookupError::config(format!(
                "Row is missing a value for key column '{}'",
                missing
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert) taking a JSON object.
    pub fn with_row(mut self, row: Value) -> Result<Self> {
        match row {
            Value::Object(map) => {
                self.insert(map)?;
                Ok(self)
            }
            other => Err(LookupError::config(format!(
                "Row must be a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn entry(&self, source_id: &str, row: &Map<String, Value>) -> Entry {
        let key = self
            .key_columns
            .iter()
            .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
            .collect();
        Entry::new(source_id, key, row.clone())
    }
}

/// Query provider over in-memory tables, one per source id.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    tables: HashMap<String, MemoryTable>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the table backing `source_id`.
    pub fn add_table(&mut self, source_id: impl Into<String>, table: MemoryTable) {
        self.tables.insert(source_id.into(), table);
    }

    pub fn table(&self, source_id: &str) -> Option<&MemoryTable> {
        self.tables.get(source_id)
    }

    fn require(&self, source_id: &str) -> Result<&MemoryTable> {
        self.tables
            .get(source_id)
            .ok_or_else(|| LookupError::UnknownSource(source_id.to_string()))
    }
}

impl QueryProvider for MemoryProvider {
    fn key_columns(&self, source_id: &str) -> Result<Vec<String>> {
        Ok(self.require(source_id)?.key_columns.clone())
    }

    fn load_all(&self, source_id: &str) -> Result<Vec<Entry>> {
        let table = self.require(source_id)?;
        Ok(table.rows.iter().map(|row| table.entry(source_id, row)).collect())
    }

    fn filter_contains(&self, source_id: &str, filter: &ContainsFilter) -> Result<Vec<Entry>> {
        let table = self.require(source_id)?;
        let needle = filter.text.to_lowercase();

        let matches = table
            .rows
            .iter()
            .filter(|row| {
                filter.targets.iter().any(|target| {
                    attribute_text(row.get(&target.attribute))
                        .to_lowercase()
                        .contains(&needle)
                })
            })
            .map(|row| table.entry(source_id, row))
            .collect();

        Ok(matches)
    }

    fn get_by_key(&self, source_id: &str, key: &[String]) -> Result<Option<Entry>> {
        let table = self.require(source_id)?;
        if key.len() != table.key_columns.len() {
            return Err(LookupError::ResolutionMismatch {
                source_id: source_id.to_string(),
                expected: table.key_columns.len(),
                actual: key.len(),
            });
        }

        let found = table.rows.iter().find(|row| {
            table
                .key_columns
                .iter()
                .zip(key)
                .all(|(column, wanted)| row.get(column).map(key_text).as_deref() == Some(wanted.as_str()))
        });

        Ok(found.map(|row| table.entry(source_id, row)))
    }
}
