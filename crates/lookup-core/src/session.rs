//! Interactive selection sessions.
//!
//! A session drives one pick from open to close:
//!
//! ```text
//! Opening → Searching ⇄ Idle → Confirmed | Cancelled
//! ```
//!
//! The presentation host feeds query text and row selections in, then
//! confirms or cancels. Closing the session resolves the selected row back
//! to its record and dispatches the callback exactly once.

use crate::config::LookupConfig;
use crate::error::{LookupError, Result};
use crate::model::{SourceSet, SourceSpec};
use crate::provider::{Entry, QueryProvider};
use crate::search::{ResultRow, SearchAggregator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`SelectionSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Opening,
    Searching,
    Idle,
    Confirmed,
    Cancelled,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Opening => "opening",
            SessionState::Searching => "searching",
            SessionState::Idle => "idle",
            SessionState::Confirmed => "confirmed",
            SessionState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Confirmed | SessionState::Cancelled)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the caller receives when a session closes.
///
/// Record data is only present when the session was confirmed on a detail
/// row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPayload {
    pub query_text: String,
    pub selected_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Entry>,
    /// Value of the source's lookup attribute, when one is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_value: Option<Value>,
    /// Extra params of the selected record's source.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Value>,
}

impl SelectionPayload {
    fn new(query_text: &str, selected_index: usize) -> Self {
        Self {
            query_text: query_text.to_string(),
            selected_index,
            source_id: None,
            record: None,
            lookup_value: None,
            params: Vec::new(),
        }
    }

    fn attach(&mut self, spec: &SourceSpec, record: Entry) {
        self.lookup_value = spec
            .lookup_attribute()
            .map(|attribute| record.attribute(attribute).cloned().unwrap_or(Value::Null));
        self.source_id = Some(spec.source_id().to_string());
        self.params = spec.params().to_vec();
        self.record = Some(record);
    }

    /// True when a record was selected.
    pub fn has_selection(&self) -> bool {
        self.record.is_some()
    }
}

/// Callback invoked once when a session closes.
pub type SelectHandler<'a> = Box<dyn FnOnce(&SelectionPayload) + 'a>;

/// One interactive pick-a-record lifecycle.
///
/// The scope is borrowed for the whole session, so the registry cannot
/// change while the session reads it.
pub struct SelectionSession<'a, P, S: ?Sized> {
    aggregator: SearchAggregator<P>,
    scope: &'a S,
    query_text: String,
    min_query_length: usize,
    rows: Vec<ResultRow>,
    selected_index: usize,
    confirmed: bool,
    state: SessionState,
    on_select: Option<SelectHandler<'a>>,
}

impl<'a, P, S> SelectionSession<'a, P, S>
where
    P: QueryProvider,
    S: SourceSet + ?Sized,
{
    /// Create a session searching `scope` through `provider`.
    pub fn new(provider: P, scope: &'a S) -> Self {
        Self::with_aggregator(SearchAggregator::new(provider), scope)
    }

    pub fn with_aggregator(aggregator: SearchAggregator<P>, scope: &'a S) -> Self {
        Self {
            aggregator,
            scope,
            query_text: String::new(),
            min_query_length: LookupConfig::DEFAULT_MIN_QUERY_LENGTH,
            rows: Vec::new(),
            selected_index: 0,
            confirmed: false,
            state: SessionState::Opening,
            on_select: None,
        }
    }

    pub fn with_min_query_length(mut self, min_query_length: usize) -> Self {
        self.min_query_length = min_query_length;
        self
    }

    /// Set the callback that receives the payload on close.
    pub fn on_select(mut self, handler: impl FnOnce(&SelectionPayload) + 'a) -> Self {
        self.on_select = Some(Box::new(handler));
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn min_query_length(&self) -> usize {
        self.min_query_length
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn selected_row(&self) -> Option<&ResultRow> {
        self.rows.get(self.selected_index)
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    fn ensure_active(&self, action: &'static str) -> Result<()> {
        if self.state.is_terminal() {
            return Err(LookupError::InvalidState {
                state: self.state.as_str(),
                action,
            });
        }
        Ok(())
    }

    /// Open the session, optionally searching for `initial_text` right away
    /// and pre-selecting `initial_index`.
    pub fn open(&mut self, initial_text: Option<&str>, initial_index: Option<usize>) -> Result<()> {
        if self.state != SessionState::Opening {
            return Err(LookupError::InvalidState {
                state: self.state.as_str(),
                action: "open",
            });
        }

        match initial_text.filter(|text| !text.is_empty()) {
            Some(text) => {
                self.search(text)?;
                if let Some(index) = initial_index {
                    self.selected_index = index.min(self.rows.len().saturating_sub(1));
                }
            }
            None => self.state = SessionState::Idle,
        }

        debug!("Opened lookup session over {} source(s)", self.scope.specs().len());
        Ok(())
    }

    /// Replace the query text and re-run the search.
    pub fn set_query_text(&mut self, text: &str) -> Result<&[ResultRow]> {
        self.ensure_active("search")?;
        self.search(text)?;
        Ok(&self.rows)
    }

    fn search(&mut self, text: &str) -> Result<()> {
        self.state = SessionState::Searching;
        self.query_text = text.to_string();

        let result = self
            .aggregator
            .run_search(text, self.min_query_length, self.scope);
        // Back to idle even when the provider failed
        self.state = SessionState::Idle;

        self.rows = result?;
        self.selected_index = 0;
        Ok(())
    }

    /// Highlight the row at `index`.
    pub fn select_row(&mut self, index: usize) -> Result<()> {
        self.ensure_active("select")?;
        if index >= self.rows.len() {
            return Err(LookupError::InvalidSelection {
                index,
                len: self.rows.len(),
            });
        }
        self.selected_index = index;
        Ok(())
    }

    /// Commit the highlighted row. The callback fires on [`close`](Self::close).
    pub fn confirm(&mut self) -> Result<()> {
        self.ensure_active("confirm")?;
        self.confirmed = true;
        self.state = SessionState::Confirmed;
        Ok(())
    }

    /// Dismiss without selecting.
    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_active("cancel")?;
        self.confirmed = false;
        self.state = SessionState::Cancelled;
        Ok(())
    }

    /// Resolve a detail row back to its record.
    ///
    /// Returns `None` for header and status rows and for out-of-range
    /// indexes.
    pub fn resolve_row(&self, index: usize) -> Result<Option<(&'a SourceSpec, Entry)>> {
        let Some(row) = self.rows.get(index).filter(|row| row.is_detail()) else {
            return Ok(None);
        };
        let (Some(source_id), Some(record_key)) = (&row.source_id, &row.record_key) else {
            return Ok(None);
        };

        let scope: &'a S = self.scope;
        let spec = scope.spec(source_id).ok_or_else(|| {
            LookupError::config(format!(
                "Source '{}' is not registered with this lookup",
                source_id
            ))
        })?;

        let provider = self.aggregator.provider();
        let key = self.aggregator.options().key_codec.decode(record_key);
        let key_columns = provider.key_columns(source_id)?;
        if key.len() != key_columns.len() {
            return Err(LookupError::ResolutionMismatch {
                source_id: source_id.clone(),
                expected: key_columns.len(),
                actual: key.len(),
            });
        }

        let record = provider
            .get_by_key(source_id, &key)?
            .ok_or_else(|| LookupError::RecordNotFound {
                source_id: source_id.clone(),
                key: key.clone(),
            })?;
        Ok(Some((spec, record)))
    }

    /// Close the session and dispatch the callback.
    ///
    /// A session closed without confirm or cancel counts as cancelled. The
    /// selected detail row is always resolved, but record data reaches the
    /// payload only when the session was confirmed.
    ///
    /// A cancelled session still delivers its payload when the record is gone
    /// or the provider fails; only integration bugs (see
    /// [`LookupError::is_integration_bug`]) abort the close. A confirmed
    /// session returns every resolution error and skips the callback.
    pub fn close(mut self) -> Result<SelectionPayload> {
        if !self.state.is_terminal() {
            self.confirmed = false;
            self.state = SessionState::Cancelled;
        }

        let mut payload = SelectionPayload::new(&self.query_text, self.selected_index);
        let resolved = match self.resolve_row(self.selected_index) {
            Ok(resolved) => resolved,
            Err(e) if !self.confirmed && !e.is_integration_bug() => {
                warn!(
                    "Could not resolve row {} of cancelled lookup: {}",
                    self.selected_index, e
                );
                None
            }
            Err(e) => return Err(e),
        };
        if let Some((spec, record)) = resolved {
            if self.confirmed {
                payload.attach(spec, record);
            }
        }

        info!(
            "Lookup session {} (query '{}', row {}, record {})",
            self.state,
            payload.query_text,
            payload.selected_index,
            if payload.has_selection() { "resolved" } else { "none" }
        );

        if let Some(handler) = self.on_select.take() {
            handler(&payload);
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MultiSourceRegistry;
    use crate::provider::{MemoryProvider, MemoryTable};
    use crate::search::RowKind;
    use serde_json::json;
    use std::cell::RefCell;

    fn provider() -> MemoryProvider {
        let people = MemoryTable::new(["id"])
            .with_row(json!({"id": 1, "name": "John", "email": "john@example.com"}))
            .unwrap()
            .with_row(json!({"id": 2, "name": "Joanna", "email": "jo@example.com"}))
            .unwrap();
        let mut provider = MemoryProvider::new();
        provider.add_table("people", people);
        provider
    }

    fn registry() -> MultiSourceRegistry {
        let mut registry = MultiSourceRegistry::new();
        let people = registry.add_source("people");
        people
            .set_display_attribute("name")
            .set_lookup_attribute("email")
            .add_param("ctx");
        people.add_field("name");
        registry
    }

    fn first_detail(rows: &[ResultRow]) -> usize {
        rows.iter().position(|r| r.kind == RowKind::Detail).unwrap()
    }

    #[test]
    fn test_open_without_text_is_idle() {
        let registry = registry();
        let mut session = SelectionSession::new(provider(), &registry);
        assert_eq!(session.state(), SessionState::Opening);

        session.open(None, None).unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.rows().is_empty());
        assert!(session.open(None, None).is_err());
    }

    #[test]
    fn test_open_with_initial_text_preselects() {
        let registry = registry();
        let mut session = SelectionSession::new(provider(), &registry);
        session.open(Some("jo"), Some(3)).unwrap();

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.query_text(), "jo");
        assert_eq!(session.rows().len(), 4);
        assert_eq!(session.selected_index(), 3);
        assert_eq!(session.selected_row().unwrap().display_text, "Joanna");

        let mut clamped = SelectionSession::new(provider(), &registry);
        clamped.open(Some("jo"), Some(99)).unwrap();
        assert_eq!(clamped.selected_index(), 3);
    }

    #[test]
    fn test_confirm_resolves_record() {
        let registry = registry();
        let received = RefCell::new(None);
        let mut session = SelectionSession::new(provider(), &registry)
            .on_select(|payload| *received.borrow_mut() = Some(payload.clone()));

        session.open(None, None).unwrap();
        let rows = session.set_query_text("joa").unwrap().to_vec();
        session.select_row(first_detail(&rows)).unwrap();
        session.confirm().unwrap();
        let payload = session.close().unwrap();

        let record = payload.record.as_ref().unwrap();
        assert_eq!(record.attribute("name"), Some(&json!("Joanna")));
        assert_eq!(payload.lookup_value, Some(json!("jo@example.com")));
        assert_eq!(payload.source_id.as_deref(), Some("people"));
        assert_eq!(payload.params, vec![json!("ctx")]);
        assert_eq!(received.into_inner(), Some(payload));
    }

    #[test]
    fn test_cancel_on_detail_row_has_no_record() {
        let registry = registry();
        let calls = RefCell::new(Vec::new());
        let mut session = SelectionSession::new(provider(), &registry)
            .on_select(|payload| calls.borrow_mut().push(payload.clone()));

        session.open(Some("jo"), None).unwrap();
        let index = first_detail(session.rows());
        session.select_row(index).unwrap();
        session.cancel().unwrap();
        let payload = session.close().unwrap();

        assert!(!payload.has_selection());
        assert_eq!(payload.lookup_value, None);
        assert_eq!(payload.query_text, "jo");
        assert_eq!(payload.selected_index, index);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_confirm_on_status_row_has_no_record() {
        let registry = registry();
        let mut session = SelectionSession::new(provider(), &registry);
        session.open(Some("jo"), None).unwrap();
        session.confirm().unwrap();
        let payload = session.close().unwrap();

        assert_eq!(payload.selected_index, 0);
        assert!(!payload.has_selection());
    }

    #[test]
    fn test_close_without_decision_counts_as_cancel() {
        let registry = registry();
        let mut session = SelectionSession::new(provider(), &registry);
        session.open(Some("john"), Some(2)).unwrap();
        let payload = session.close().unwrap();
        assert!(!payload.has_selection());
    }

    #[test]
    fn test_terminal_state_rejects_actions() {
        let registry = registry();
        let mut session = SelectionSession::new(provider(), &registry);
        session.open(None, None).unwrap();
        session.cancel().unwrap();

        assert!(matches!(
            session.set_query_text("jo"),
            Err(LookupError::InvalidState { state: "cancelled", .. })
        ));
        assert!(session.confirm().is_err());
        assert!(session.select_row(0).is_err());
    }

    #[test]
    fn test_select_row_out_of_range() {
        let registry = registry();
        let mut session = SelectionSession::new(provider(), &registry);
        session.open(Some("jo"), None).unwrap();
        assert!(matches!(
            session.select_row(10),
            Err(LookupError::InvalidSelection { index: 10, len: 4 })
        ));
    }

    #[test]
    fn test_short_text_resets_to_prompt() {
        let registry = registry();
        let mut session = SelectionSession::new(provider(), &registry).with_min_query_length(3);
        session.open(None, None).unwrap();

        let rows = session.set_query_text("jo").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_text, "Enter search criteria..");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let registry = registry();
        let mut session = SelectionSession::new(provider(), &registry);
        session.open(Some("jo"), None).unwrap();
        let index = first_detail(session.rows());

        let (_, first) = session.resolve_row(index).unwrap().unwrap();
        let (_, second) = session.resolve_row(index).unwrap().unwrap();
        assert_eq!(first, second);
        assert!(session.resolve_row(0).unwrap().is_none());
    }

    #[test]
    fn test_unregistered_source_is_configuration_error() {
        let registry = registry();
        let mut session = SelectionSession::new(provider(), &registry);
        session.open(Some("jo"), None).unwrap();
        let index = first_detail(session.rows());
        session.rows[index].source_id = Some("ghost".to_string());
        session.select_row(index).unwrap();
        session.confirm().unwrap();

        let err = session.close().unwrap_err();
        assert!(err.is_integration_bug());
    }

    #[test]
    fn test_key_arity_mismatch_aborts_resolution() {
        let registry = registry();
        let mut session = SelectionSession::new(provider(), &registry);
        session.open(Some("jo"), None).unwrap();
        let index = first_detail(session.rows());
        session.rows[index].record_key = Some("1,extra".to_string());
        session.select_row(index).unwrap();
        session.confirm().unwrap();

        assert!(matches!(
            session.close(),
            Err(LookupError::ResolutionMismatch {
                expected: 1,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_cancel_on_missing_record_still_fires_callback() {
        let registry = registry();
        let calls = RefCell::new(Vec::new());
        let mut session = SelectionSession::new(provider(), &registry)
            .on_select(|payload| calls.borrow_mut().push(payload.clone()));
        session.open(Some("jo"), None).unwrap();
        let index = first_detail(session.rows());
        session.rows[index].record_key = Some("99".to_string());
        session.select_row(index).unwrap();
        session.cancel().unwrap();

        let payload = session.close().unwrap();
        assert_eq!(payload.query_text, "jo");
        assert_eq!(payload.selected_index, index);
        assert!(!payload.has_selection());
        assert_eq!(calls.into_inner(), vec![payload]);
    }

    #[test]
    fn test_confirm_on_missing_record_is_an_error() {
        let registry = registry();
        let fired = RefCell::new(0);
        let mut session = SelectionSession::new(provider(), &registry)
            .on_select(|_| *fired.borrow_mut() += 1);
        session.open(Some("jo"), None).unwrap();
        let index = first_detail(session.rows());
        session.rows[index].record_key = Some("99".to_string());
        session.select_row(index).unwrap();
        session.confirm().unwrap();

        assert!(matches!(
            session.close(),
            Err(LookupError::RecordNotFound { ref key, .. }) if key == &vec!["99".to_string()]
        ));
        assert_eq!(fired.into_inner(), 0);
    }

    #[test]
    fn test_cancel_keeps_integration_bugs_fatal() {
        let registry = registry();
        let fired = RefCell::new(0);
        let mut session = SelectionSession::new(provider(), &registry)
            .on_select(|_| *fired.borrow_mut() += 1);
        session.open(Some("jo"), None).unwrap();
        let index = first_detail(session.rows());
        session.rows[index].record_key = Some("1,extra".to_string());
        session.select_row(index).unwrap();
        session.cancel().unwrap();

        assert!(matches!(
            session.close(),
            Err(LookupError::ResolutionMismatch { .. })
        ));
        assert_eq!(fired.into_inner(), 0);
    }
}
