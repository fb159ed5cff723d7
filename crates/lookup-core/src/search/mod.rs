//! Search aggregation across one or more sources.
//!
//! This module provides:
//! - The result row model shared with presentation hosts
//! - The aggregator that merges per-source matches into one ordered list
//! - Record-key transport encoding and row formatters

mod aggregator;
mod key;
mod markup;

pub use aggregator::{AggregatorOptions, SearchAggregator};
pub use key::KeyCodec;
pub use markup::{HtmlSpanFormatter, PlainFormatter, RowFormatter};

use crate::config::LookupConfig;
use serde::{Deserialize, Serialize};

/// Role of a row in an assembled result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// Section label of a source with matches.
    Header,
    /// One matching record.
    Detail,
    /// Prompt or result summary.
    Status,
}

/// One line of an assembled search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub kind: RowKind,
    pub display_text: String,
    /// Source of the record; detail rows only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Transport-encoded key of the record; detail rows only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_key: Option<String>,
    pub order: u32,
}

impl ResultRow {
    pub fn header(text: impl Into<String>, order: u32) -> Self {
        Self {
            kind: RowKind::Header,
            display_text: text.into(),
            source_id: None,
            record_key: None,
            order,
        }
    }

    pub fn detail(
        source_id: impl Into<String>,
        record_key: impl Into<String>,
        text: impl Into<String>,
        order: u32,
    ) -> Self {
        Self {
            kind: RowKind::Detail,
            display_text: text.into(),
            source_id: Some(source_id.into()),
            record_key: Some(record_key.into()),
            order,
        }
    }

    /// Status rows always sort to the head of the list.
    pub fn status(text: impl Into<String>) -> Self {
        Self {
            kind: RowKind::Status,
            display_text: text.into(),
            source_id: None,
            record_key: None,
            order: 0,
        }
    }

    /// Status row summarizing a search that found `count` records.
    pub fn summary(count: usize) -> Self {
        if count > 0 {
            Self::status(LookupConfig::found_text(count))
        } else {
            Self::status(LookupConfig::NO_RESULTS_TEXT)
        }
    }

    pub fn is_detail(&self) -> bool {
        self.kind == RowKind::Detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_rows() {
        assert_eq!(ResultRow::summary(0).display_text, "No results found.");
        assert_eq!(ResultRow::summary(1).display_text, "Found 1 record.");
        assert_eq!(ResultRow::summary(3).display_text, "Found 3 records.");
        assert_eq!(ResultRow::summary(3).order, 0);
    }

    #[test]
    fn test_row_serialization_omits_missing_identity() {
        let json = serde_json::to_value(ResultRow::header("People", 1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "header", "displayText": "People", "order": 1})
        );

        let detail = ResultRow::detail("people", "1,2", "John", 1);
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["sourceId"], "people");
        assert_eq!(json["recordKey"], "1,2");
        assert!(detail.is_detail());
    }
}
