//! Lookup configuration model.
//!
//! This module provides:
//! - Field and source descriptors
//! - The multi-source registry and search scopes
//! - JSON manifests and value-list lookups

mod field;
mod manifest;
mod registry;
mod source;
mod valuelist;

pub use field::FieldSpec;
pub use manifest::{FieldManifest, FullFieldManifest, RegistryManifest, SourceManifest};
pub use registry::{MultiSourceRegistry, SourceSet};
pub use source::{DataSource, SourceSpec};
pub use valuelist::{valuelist_lookup, ValueList, ValueListItem, ValueListKind};
