//! Centralized configuration constants for the lookup engine.

/// Search and result-assembly settings.
pub struct LookupConfig;

impl LookupConfig {
    /// Minimum query length used when a lookup is opened with initial text.
    pub const DEFAULT_MIN_QUERY_LENGTH: usize = 2;

    /// Separator between key components in a transported record key.
    pub const KEY_DELIMITER: char = ',';
    /// Escape character used by the escaped key codec.
    pub const KEY_ESCAPE: char = '\\';

    pub const PROMPT_TEXT: &'static str = "Enter search criteria..";
    pub const NO_RESULTS_TEXT: &'static str = "No results found.";

    /// Status text reported after a search that found `count` records.
    pub fn found_text(count: usize) -> String {
        let plural = if count > 1 { "s" } else { "" };
        format!("Found {} record{}.", count, plural)
    }
}

/// Defaults applied to field and source specs.
pub struct SpecDefaults;

impl SpecDefaults {
    pub const FIELD_WIDTH: &'static str = "auto";
    pub const VALUELIST_SOURCE_PREFIX: &'static str = "mem:valuelist_";
    pub const VALUELIST_TITLE: &'static str = "Value";
    pub const VALUELIST_DISPLAY_COLUMN: &'static str = "displayvalue";
    pub const VALUELIST_REAL_COLUMN: &'static str = "realvalue";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_text_pluralizes() {
        assert_eq!(LookupConfig::found_text(1), "Found 1 record.");
        assert_eq!(LookupConfig::found_text(2), "Found 2 records.");
        assert_eq!(LookupConfig::found_text(120), "Found 120 records.");
    }

    #[test]
    fn test_min_query_length_is_positive() {
        assert!(LookupConfig::DEFAULT_MIN_QUERY_LENGTH > 0);
    }
}
