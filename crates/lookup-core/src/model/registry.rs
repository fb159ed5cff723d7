//! Multi-source registry and search scopes.

use std::collections::HashMap;

use super::source::{DataSource, SourceSpec};

/// A set of sources that can be searched together.
///
/// Implemented by a single [`SourceSpec`] and by [`MultiSourceRegistry`].
/// `specs` defines the order in which sources are searched.
pub trait SourceSet {
    fn specs(&self) -> &[SourceSpec];

    /// Spec registered for `source_id`.
    fn spec(&self, source_id: &str) -> Option<&SourceSpec> {
        self.specs().iter().find(|s| s.source_id() == source_id)
    }
}

impl SourceSet for SourceSpec {
    fn specs(&self) -> &[SourceSpec] {
        std::slice::from_ref(self)
    }
}

/// Source specs keyed by source id.
///
/// Iteration follows insertion order. Re-adding an existing source id
/// replaces the spec in place.
#[derive(Debug, Clone, Default)]
pub struct MultiSourceRegistry {
    sources: Vec<SourceSpec>,
    positions: HashMap<String, usize>,
}

impl MultiSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with one default spec per data source.
    pub fn from_data_sources<I, D>(data_sources: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DataSource>,
    {
        let mut registry = Self::new();
        for data_source in data_sources {
            let data_source = data_source.into();
            registry.add_source(data_source.source_id());
        }
        registry
    }

    /// Create and register a spec for `source_id`, with the id as header.
    pub fn add_source(&mut self, source_id: &str) -> &mut SourceSpec {
        let mut spec = SourceSpec::new(source_id);
        spec.set_header(source_id);
        self.insert(spec)
    }

    /// Register a fully built spec.
    pub fn insert(&mut self, spec: SourceSpec) -> &mut SourceSpec {
        let position = match self.positions.get(spec.source_id()) {
            Some(&position) => {
                self.sources[position] = spec;
                position
            }
            None => {
                let position = self.sources.len();
                self.positions.insert(spec.source_id().to_string(), position);
                self.sources.push(spec);
                position
            }
        };
        &mut self.sources[position]
    }

    pub fn get_source(&self, source_id: &str) -> Option<&SourceSpec> {
        self.positions.get(source_id).map(|&i| &self.sources[i])
    }

    pub fn get_source_mut(&mut self, source_id: &str) -> Option<&mut SourceSpec> {
        self.positions.get(source_id).map(|&i| &mut self.sources[i])
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.positions.contains_key(source_id)
    }

    /// All specs, in insertion order.
    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceSet for MultiSourceRegistry {
    fn specs(&self) -> &[SourceSpec] {
        &self.sources
    }

    fn spec(&self, source_id: &str) -> Option<&SourceSpec> {
        self.get_source(source_id)
    }
}
