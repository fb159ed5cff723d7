//! Lookups over value lists (display/real value pairs).

use crate::config::SpecDefaults;
use crate::error::{LookupError, Result};
use crate::provider::MemoryTable;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::source::SourceSpec;

/// How a value list gets its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueListKind {
    /// Fixed items.
    Custom,
    /// Items loaded from a table.
    Database,
    /// Items computed by a method at runtime.
    GlobalMethod,
    /// Items that depend on a relation of the current record.
    Related,
}

impl ValueListKind {
    /// Only lists whose items are known up front can back a lookup.
    pub fn is_lookup_compatible(&self) -> bool {
        matches!(self, ValueListKind::Custom | ValueListKind::Database)
    }
}

/// One display/real pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueListItem {
    pub display: String,
    pub real: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueList {
    pub name: String,
    pub kind: ValueListKind,
    pub items: Vec<ValueListItem>,
}

impl ValueList {
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ValueListKind::Custom,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, display: impl Into<String>, real: impl Into<Value>) -> Self {
        self.items.push(ValueListItem {
            display: display.into(),
            real: real.into(),
        });
        self
    }

    /// Source id of the in-memory source holding this list's items.
    pub fn source_id(&self) -> String {
        format!("{}{}", SpecDefaults::VALUELIST_SOURCE_PREFIX, self.name)
    }
}

/// Build a lookup over a value list.
///
/// Returns the spec and the in-memory table with the list's items; register
/// the table with a [`MemoryProvider`](crate::provider::MemoryProvider)
/// under the spec's source id. Selection yields the real value.
pub fn valuelist_lookup(list: &ValueList, title_text: Option<&str>) -> Result<(SourceSpec, MemoryTable)> {
    if list.name.trim().is_empty() {
        return Err(LookupError::config("Cannot use a value list without a name"));
    }
    if !list.kind.is_lookup_compatible() {
        return Err(LookupError::config(format!(
            "The value list {} must be a value list of type custom or database",
            list.name
        )));
    }

    let display_column = SpecDefaults::VALUELIST_DISPLAY_COLUMN;
    let real_column = SpecDefaults::VALUELIST_REAL_COLUMN;

    let mut table = MemoryTable::new([real_column]);
    for item in &list.items {
        table = table.with_row(json!({
            display_column: item.display,
            real_column: item.real,
        }))?;
    }

    let mut spec = SourceSpec::new(list.source_id());
    spec.set_lookup_attribute(real_column)
        .set_display_attribute(display_column);
    spec.add_field(display_column)
        .set_title_text(title_text.filter(|t| !t.is_empty()).unwrap_or(SpecDefaults::VALUELIST_TITLE));

    Ok((spec, table))
}
