//! Turns query text into one ordered result list spanning every source.

use crate::config::LookupConfig;
use crate::error::Result;
use crate::model::{SourceSet, SourceSpec};
use crate::provider::{attribute_text, ContainsFilter, Entry, QueryProvider};
use std::time::Instant;
use tracing::{debug, warn};

use super::key::KeyCodec;
use super::ResultRow;

/// Tuning knobs for result assembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregatorOptions {
    /// Encoding of record keys in detail rows.
    pub key_codec: KeyCodec,
    /// Skip (and log) a source whose query fails instead of aborting the
    /// whole search.
    pub isolate_source_failures: bool,
}

/// Runs searches against a query provider.
pub struct SearchAggregator<P> {
    provider: P,
    options: AggregatorOptions,
}

impl<P: QueryProvider> SearchAggregator<P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, AggregatorOptions::default())
    }

    pub fn with_options(provider: P, options: AggregatorOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn options(&self) -> &AggregatorOptions {
        &self.options
    }

    /// Search every source in `scope` and assemble the result rows.
    ///
    /// Text shorter than `min_query_length` characters yields only a prompt
    /// row and queries nothing. Otherwise each source with matches
    /// contributes a header followed by its detail rows, and one summary
    /// status row is added. Rows are stably sorted by `order`, so status
    /// rows come first.
    pub fn run_search<S>(&self, query_text: &str, min_query_length: usize, scope: &S) -> Result<Vec<ResultRow>>
    where
        S: SourceSet + ?Sized,
    {
        if query_text.chars().count() < min_query_length {
            return Ok(vec![ResultRow::status(LookupConfig::PROMPT_TEXT)]);
        }

        let start = Instant::now();
        let mut rows = Vec::new();
        let mut group_order: u32 = 0;
        let mut detail_count = 0;

        for spec in scope.specs() {
            let entries = match self.query_source(spec, query_text) {
                Ok(entries) => entries,
                Err(e) if self.options.isolate_source_failures => {
                    warn!("Skipping source {} after query failure: {}", spec.source_id(), e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            debug!("Source {} matched {} entries", spec.source_id(), entries.len());
            if entries.is_empty() {
                continue;
            }

            group_order += 1;
            rows.push(ResultRow::header(spec.header(), group_order));
            for entry in &entries {
                rows.push(self.detail_row(spec, entry, group_order));
            }
            detail_count += entries.len();
        }

        rows.push(ResultRow::summary(detail_count));
        rows.sort_by_key(|row| row.order);

        debug!(
            "Search '{}' produced {} rows in {:.2}ms",
            query_text,
            rows.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(rows)
    }

    fn query_source(&self, spec: &SourceSpec, query_text: &str) -> Result<Vec<Entry>> {
        if query_text.is_empty() {
            return self.provider.load_all(spec.source_id());
        }

        let filter = spec
            .searchable_fields()
            .fold(ContainsFilter::new(query_text), |filter, field| {
                filter.with_target(field.attribute(), field.title_text())
            });
        if filter.targets.is_empty() {
            return Ok(Vec::new());
        }
        self.provider.filter_contains(spec.source_id(), &filter)
    }

    fn detail_row(&self, spec: &SourceSpec, entry: &Entry, order: u32) -> ResultRow {
        let key = self.options.key_codec.encode(entry.key_components().as_slice());
        let text = match spec.display_attribute() {
            Some(attribute) => attribute_text(entry.attribute(attribute)),
            None => entry.key_components().join(", "),
        };
        ResultRow::detail(spec.source_id(), key, text, order)
    }
}
