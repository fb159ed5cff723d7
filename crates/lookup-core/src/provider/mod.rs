//! Query providers: the data access behind every source.
//!
//! The engine never talks to storage directly. Each search and each
//! resolution goes through a [`QueryProvider`], addressed by source id.
//!
//! - [`MemoryProvider`] keeps tables in memory (value lists, tests)
//! - [`SqliteProvider`] maps every source to a SQLite table

mod memory;
mod query;
mod sqlite;

pub use memory::{MemoryProvider, MemoryTable};
pub use query::{escape_like_pattern, key_text, quote_identifier};
pub(crate) use query::attribute_text;
pub use sqlite::SqliteProvider;

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record returned by a query provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub source_id: String,
    /// Key-column values in declared key-column order.
    pub key: Vec<Value>,
    pub attributes: Map<String, Value>,
}

impl Entry {
    pub fn new(source_id: impl Into<String>, key: Vec<Value>, attributes: Map<String, Value>) -> Self {
        Self {
            source_id: source_id.into(),
            key,
            attributes,
        }
    }

    /// Value of an attribute, if the record has it.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Textual form of every key component, as used in transport keys.
    pub fn key_components(&self) -> Vec<String> {
        self.key.iter().map(key_text).collect()
    }
}

/// One attribute taking part in a contains filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTarget {
    pub attribute: String,
    /// Human-readable name for diagnostics.
    pub alias: String,
}

/// "Attribute contains text" conditions OR-ed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainsFilter {
    pub text: String,
    pub targets: Vec<FilterTarget>,
}

impl ContainsFilter {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, attribute: impl Into<String>, alias: impl Into<String>) -> Self {
        self.targets.push(FilterTarget {
            attribute: attribute.into(),
            alias: alias.into(),
        });
        self
    }

    /// Aliases of all targets, for log output.
    pub fn aliases(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.alias.as_str()).collect()
    }
}

/// Data access for lookup sources.
///
/// All operations are synchronous; a slow provider blocks the caller.
/// Entries are returned in the provider's native, stable order.
pub trait QueryProvider {
    /// Names of the key columns of a source, in declared order.
    fn key_columns(&self, source_id: &str) -> Result<Vec<String>>;

    /// Every entry of a source.
    fn load_all(&self, source_id: &str) -> Result<Vec<Entry>>;

    /// Entries where any target attribute contains the filter text.
    fn filter_contains(&self, source_id: &str, filter: &ContainsFilter) -> Result<Vec<Entry>>;

    /// Exact-match lookup by key. `key` must have one component per key column.
    fn get_by_key(&self, source_id: &str, key: &[String]) -> Result<Option<Entry>>;
}

impl<P: QueryProvider + ?Sized> QueryProvider for &P {
    fn key_columns(&self, source_id: &str) -> Result<Vec<String>> {
        (**self).key_columns(source_id)
    }

    fn load_all(&self, source_id: &str) -> Result<Vec<Entry>> {
        (**self).load_all(source_id)
    }

    fn filter_contains(&self, source_id: &str, filter: &ContainsFilter) -> Result<Vec<Entry>> {
        (**self).filter_contains(source_id, filter)
    }

    fn get_by_key(&self, source_id: &str, key: &[String]) -> Result<Option<Entry>> {
        (**self).get_by_key(source_id, key)
    }
}
