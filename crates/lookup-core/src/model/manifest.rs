//! JSON registry manifests.
//!
//! A manifest declares the sources of a lookup up front:
//!
//! ```json
//! {
//!   "minQueryLength": 2,
//!   "sources": [
//!     {
//!       "sourceId": "db:/crm/people",
//!       "header": "People",
//!       "displayAttribute": "name",
//!       "fields": ["name", { "attribute": "city", "titleText": "City" }]
//!     }
//!   ]
//! }
//! ```

use crate::error::{LookupError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use super::field::FieldSpec;
use super::registry::MultiSourceRegistry;
use super::source::SourceSpec;

fn default_true() -> bool {
    true
}

/// Top-level manifest document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryManifest {
    #[serde(default)]
    pub min_query_length: Option<usize>,
    pub sources: Vec<SourceManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceManifest {
    pub source_id: String,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub display_attribute: Option<String>,
    #[serde(default)]
    pub lookup_attribute: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldManifest>,
    #[serde(default)]
    pub params: Vec<Value>,
}

/// A field given either by attribute name or in full.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldManifest {
    Attribute(String),
    Full(FullFieldManifest),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullFieldManifest {
    pub attribute: String,
    #[serde(default = "default_true")]
    pub searchable: bool,
    #[serde(default)]
    pub title_text: Option<String>,
    #[serde(default)]
    pub value_list_name: Option<String>,
    #[serde(default)]
    pub display_format: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub style_class: Option<String>,
    #[serde(default)]
    pub style_class_attribute: Option<String>,
    #[serde(default)]
    pub width: Option<String>,
}

impl FieldManifest {
    fn attribute(&self) -> &str {
        match self {
            FieldManifest::Attribute(name) => name,
            FieldManifest::Full(full) => &full.attribute,
        }
    }

    fn apply(&self, field: &mut FieldSpec) {
        let FieldManifest::Full(full) = self else {
            return;
        };
        field.set_searchable(full.searchable).set_visible(full.visible);
        if let Some(title) = &full.title_text {
            field.set_title_text(title);
        }
        if let Some(name) = &full.value_list_name {
            field.set_value_list_name(name);
        }
        if let Some(format) = &full.display_format {
            field.set_display_format(format);
        }
        if let Some(class) = &full.style_class {
            field.set_style_class(class);
        }
        if let Some(attribute) = &full.style_class_attribute {
            field.set_style_class_attribute(attribute);
        }
        if let Some(width) = &full.width {
            field.set_width(width);
        }
    }
}

impl RegistryManifest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json =
            std::fs::read_to_string(path).map_err(|e| LookupError::io_with_path(e, path))?;
        Self::from_json_str(&json)
    }

    /// Validate the manifest and build the registry it describes.
    pub fn into_registry(self) -> Result<MultiSourceRegistry> {
        let mut registry = MultiSourceRegistry::new();
        let mut seen = HashSet::new();

        for source in self.sources {
            if source.source_id.trim().is_empty() {
                return Err(LookupError::config("Source id must not be empty"));
            }
            if !seen.insert(source.source_id.clone()) {
                return Err(LookupError::config(format!(
                    "Source '{}' is declared more than once",
                    source.source_id
                )));
            }
            registry.insert(source.into_spec()?);
        }

        debug!("Built registry with {} source(s)", registry.len());
        Ok(registry)
    }
}

impl SourceManifest {
    fn into_spec(self) -> Result<SourceSpec> {
        let mut spec = SourceSpec::new(&self.source_id);
        spec.set_header(self.header.as_deref().unwrap_or(&self.source_id));

        for field in &self.fields {
            if field.attribute().trim().is_empty() {
                return Err(LookupError::config(format!(
                    "Source '{}' has a field without attribute",
                    self.source_id
                )));
            }
            field.apply(spec.add_field(field.attribute()));
        }

        if let Some(attribute) = self.display_attribute {
            spec.set_display_attribute(attribute);
        }
        if let Some(attribute) = self.lookup_attribute {
            spec.set_lookup_attribute(attribute);
        }
        for param in self.params {
            spec.add_param(param);
        }
        Ok(spec)
    }
}
