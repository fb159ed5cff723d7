//! Lookup Core - search aggregation and selection engine for record lookups.
//!
//! A lookup lets a user pick one record (or one field value) out of one or
//! more sources by typing free text. This crate contains everything except
//! the presentation: the configuration model, the multi-source search that
//! turns query text into one ordered result list, and the selection session
//! that maps a chosen row back to its record.
//!
//! # Example
//!
//! ```rust,ignore
//! use lookup_core::{MultiSourceRegistry, SelectionSession, SqliteProvider};
//!
//! fn main() -> lookup_core::Result<()> {
//!     let provider = SqliteProvider::open("/path/to/crm.db")?;
//!
//!     let mut registry = MultiSourceRegistry::new();
//!     registry
//!         .add_source("db:/crm/people")
//!         .set_display_attribute("name")
//!         .add_field("name");
//!
//!     let mut session = SelectionSession::new(&provider, &registry)
//!         .on_select(|payload| println!("picked {:?}", payload.record));
//!     session.open(Some("jo"), None)?;
//!     session.select_row(2)?;
//!     session.confirm()?;
//!     session.close()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod search;
pub mod session;

// Re-export commonly used types
pub use config::LookupConfig;
pub use error::{LookupError, Result};
pub use model::{
    valuelist_lookup, DataSource, FieldSpec, MultiSourceRegistry, RegistryManifest, SourceSet,
    SourceSpec, ValueList, ValueListKind,
};
pub use provider::{
    ContainsFilter, Entry, MemoryProvider, MemoryTable, QueryProvider, SqliteProvider,
};
pub use search::{
    AggregatorOptions, HtmlSpanFormatter, KeyCodec, PlainFormatter, ResultRow, RowFormatter,
    RowKind, SearchAggregator,
};
pub use session::{SelectionPayload, SelectionSession, SessionState};
