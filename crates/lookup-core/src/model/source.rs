//! Queryable source descriptor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::field::FieldSpec;
use crate::provider::Entry;

/// Anything a lookup can be created from.
///
/// A plain source id, or a record whose own source is looked up.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Id(String),
    Record(Entry),
}

impl DataSource {
    pub fn source_id(&self) -> &str {
        match self {
            DataSource::Id(id) => id,
            DataSource::Record(entry) => &entry.source_id,
        }
    }
}

impl From<&str> for DataSource {
    fn from(id: &str) -> Self {
        DataSource::Id(id.to_string())
    }
}

impl From<String> for DataSource {
    fn from(id: String) -> Self {
        DataSource::Id(id)
    }
}

impl From<Entry> for DataSource {
    fn from(entry: Entry) -> Self {
        DataSource::Record(entry)
    }
}

impl From<&Entry> for DataSource {
    fn from(entry: &Entry) -> Self {
        DataSource::Id(entry.source_id.clone())
    }
}

/// One queryable source: its fields, display rules and callback params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    source_id: String,
    fields: Vec<FieldSpec>,
    lookup_attribute: Option<String>,
    display_attribute: Option<String>,
    header: String,
    params: Vec<Value>,
}

impl SourceSpec {
    /// Create a spec for `source_id`. The header defaults to the last path
    /// segment of the id.
    pub fn new(source_id: impl Into<String>) -> Self {
        let source_id = source_id.into();
        let header = last_segment(&source_id).to_string();
        Self {
            source_id,
            fields: Vec::new(),
            lookup_attribute: None,
            display_attribute: None,
            header,
            params: Vec::new(),
        }
    }

    /// Create a spec from a source id or a record.
    pub fn for_data_source(data_source: impl Into<DataSource>) -> Self {
        Self::new(data_source.into().source_id())
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    // Fields

    /// Append a field and return it for further configuration.
    pub fn add_field(&mut self, attribute: impl Into<String>) -> &mut FieldSpec {
        self.fields.push(FieldSpec::new(attribute));
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }

    pub fn field(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    pub fn field_mut(&mut self, index: usize) -> Option<&mut FieldSpec> {
        self.fields.get_mut(index)
    }

    /// Remove the field at `index`; out-of-range indexes are ignored.
    pub fn remove_field(&mut self, index: usize) -> Option<FieldSpec> {
        (index < self.fields.len()).then(|| self.fields.remove(index))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Fields taking part in text matching, in field order.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_searchable())
    }

    // Display and lookup attributes

    /// Make selection yield this attribute's value.
    pub fn set_lookup_attribute(&mut self, attribute: impl Into<String>) -> &mut Self {
        self.lookup_attribute = Some(attribute.into());
        self
    }

    pub fn lookup_attribute(&self) -> Option<&str> {
        self.lookup_attribute.as_deref()
    }

    /// Attribute rendered in result rows.
    pub fn set_display_attribute(&mut self, attribute: impl Into<String>) -> &mut Self {
        self.display_attribute = Some(attribute.into());
        self
    }

    /// Attribute rendered in result rows. Falls back to the first visible
    /// field when none was set.
    pub fn display_attribute(&self) -> Option<&str> {
        self.display_attribute.as_deref().or_else(|| {
            self.fields
                .iter()
                .find(|f| f.is_visible())
                .map(|f| f.attribute())
        })
    }

    /// Set the header label and return the resolved header.
    ///
    /// Empty text derives the header from the last `/` segment of the
    /// source id.
    pub fn set_header(&mut self, text: &str) -> &str {
        self.header = if text.is_empty() {
            last_segment(&self.source_id).to_string()
        } else {
            text.to_string()
        };
        &self.header
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    // Callback params

    pub fn add_param(&mut self, param: impl Into<Value>) -> &mut Self {
        self.params.push(param.into());
        self
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn remove_param(&mut self, index: usize) -> Option<Value> {
        (index < self.params.len()).then(|| self.params.remove(index))
    }

    pub fn clear_params(&mut self) {
        self.params.clear();
    }
}

fn last_segment(source_id: &str) -> &str {
    source_id.rsplit('/').next().unwrap_or(source_id)
}
