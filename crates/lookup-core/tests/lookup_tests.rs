//! Integration tests for lookups over SQLite and in-memory sources.
//!
//! These tests drive full sessions the way a presentation host would:
//! type, highlight, confirm or cancel, close.

use lookup_core::{
    valuelist_lookup, AggregatorOptions, KeyCodec, LookupError, MemoryProvider, MemoryTable,
    MultiSourceRegistry, RegistryManifest, ResultRow, RowKind, SearchAggregator,
    SelectionSession, SqliteProvider, ValueList,
};
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

/// Create a CRM database file with people, companies and order lines.
fn create_test_db() -> (SqliteProvider, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("crm.db");

    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "
        CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT);
        INSERT INTO people VALUES (1, 'John Smith', 'john@example.com');
        INSERT INTO people VALUES (2, 'Mark Jones', 'mark@example.com');
        INSERT INTO people VALUES (3, 'Ann Lee', 'ann@example.com');

        CREATE TABLE companies (code TEXT PRIMARY KEY, name TEXT NOT NULL);
        INSERT INTO companies VALUES ('ACME', 'Acme Corp');

        CREATE TABLE order_lines (
            customer TEXT NOT NULL,
            line_no INTEGER NOT NULL,
            product TEXT NOT NULL,
            PRIMARY KEY (customer, line_no)
        );
        INSERT INTO order_lines VALUES ('Doe, Jane', 1, 'Jogging shoes');
        INSERT INTO order_lines VALUES ('Doe, Jane', 2, 'Rain jacket');
        ",
    )
    .unwrap();
    drop(conn);

    let provider = SqliteProvider::open(&db_path).unwrap();
    (provider, temp_dir)
}

fn crm_registry() -> MultiSourceRegistry {
    RegistryManifest::from_json_str(
        r#"{
            "sources": [
                {
                    "sourceId": "db:/crm/people",
                    "header": "People",
                    "displayAttribute": "name",
                    "lookupAttribute": "email",
                    "fields": ["name", { "attribute": "email", "titleText": "E-mail" }],
                    "params": ["from-people"]
                },
                {
                    "sourceId": "db:/crm/companies",
                    "header": "Companies",
                    "displayAttribute": "name",
                    "fields": ["name"]
                },
                {
                    "sourceId": "db:/crm/order_lines",
                    "header": "Order lines",
                    "displayAttribute": "product",
                    "fields": ["product"]
                }
            ]
        }"#,
    )
    .unwrap()
    .into_registry()
    .unwrap()
}

#[test]
fn test_search_spans_sources_in_registry_order() {
    let (provider, _temp) = create_test_db();
    let aggregator = SearchAggregator::new(&provider);

    let rows = aggregator.run_search("jo", 2, &crm_registry()).unwrap();
    let summary: Vec<_> = rows
        .iter()
        .map(|r| (r.kind, r.display_text.as_str()))
        .collect();

    assert_eq!(
        summary,
        vec![
            (RowKind::Status, "Found 3 records."),
            (RowKind::Header, "People"),
            (RowKind::Detail, "John Smith"),
            (RowKind::Detail, "Mark Jones"),
            (RowKind::Header, "Order lines"),
            (RowKind::Detail, "Jogging shoes"),
        ]
    );
}

#[test]
fn test_detail_count_matches_sum_of_source_matches() {
    let (provider, _temp) = create_test_db();
    let registry = crm_registry();
    let aggregator = SearchAggregator::new(&provider);

    let rows = aggregator.run_search("example", 2, &registry).unwrap();
    let details: Vec<&ResultRow> = rows.iter().filter(|r| r.is_detail()).collect();
    assert_eq!(details.len(), 3);
    assert!(details
        .iter()
        .all(|r| registry.contains(r.source_id.as_deref().unwrap())));
}

#[test]
fn test_confirmed_pick_over_sqlite() {
    let (provider, _temp) = create_test_db();
    let registry = crm_registry();

    let mut session = SelectionSession::new(&provider, &registry);
    session.open(None, None).unwrap();
    session.set_query_text("mark").unwrap();
    let index = session
        .rows()
        .iter()
        .position(|r| r.display_text == "Mark Jones")
        .unwrap();
    session.select_row(index).unwrap();
    session.confirm().unwrap();

    let payload = session.close().unwrap();
    assert_eq!(payload.query_text, "mark");
    assert_eq!(payload.source_id.as_deref(), Some("db:/crm/people"));
    assert_eq!(payload.lookup_value, Some(json!("mark@example.com")));
    assert_eq!(payload.params, vec![json!("from-people")]);
    assert_eq!(payload.record.unwrap().key, vec![json!(2)]);
}

#[test]
fn test_composite_key_with_comma_resolves() {
    let (provider, _temp) = create_test_db();
    let registry = crm_registry();

    let mut session = SelectionSession::new(&provider, &registry);
    session.open(Some("rain"), None).unwrap();
    let index = session.rows().iter().position(|r| r.is_detail()).unwrap();
    assert_eq!(
        session.rows()[index].record_key.as_deref(),
        Some("Doe\\, Jane,2")
    );

    session.select_row(index).unwrap();
    session.confirm().unwrap();
    let record = session.close().unwrap().record.unwrap();
    assert_eq!(record.attribute("product"), Some(&json!("Rain jacket")));
}

#[test]
fn test_legacy_comma_codec_cannot_resolve_commas() {
    let (provider, _temp) = create_test_db();
    let registry = crm_registry();
    let aggregator = SearchAggregator::with_options(
        &provider,
        AggregatorOptions {
            key_codec: KeyCodec::Comma,
            ..Default::default()
        },
    );

    let mut session = SelectionSession::with_aggregator(aggregator, &registry);
    session.open(Some("rain"), None).unwrap();
    let index = session.rows().iter().position(|r| r.is_detail()).unwrap();
    session.select_row(index).unwrap();
    session.confirm().unwrap();

    let err = session.close().unwrap_err();
    assert!(matches!(err, LookupError::ResolutionMismatch { .. }));
}

#[test]
fn test_cancel_fires_callback_without_record() {
    let (provider, _temp) = create_test_db();
    let registry = crm_registry();
    let mut fired = 0;

    {
        let mut session = SelectionSession::new(&provider, &registry).on_select(|payload| {
            fired += 1;
            assert!(payload.record.is_none());
            assert_eq!(payload.query_text, "ann");
        });
        session.open(Some("ann"), Some(2)).unwrap();
        session.cancel().unwrap();
        session.close().unwrap();
    }

    assert_eq!(fired, 1);
}

#[test]
fn test_valuelist_lookup_returns_real_value() {
    let list = ValueList::custom("countries")
        .with_item("Netherlands", "NL")
        .with_item("New Zealand", "NZ")
        .with_item("Germany", "DE");
    let (spec, table) = valuelist_lookup(&list, Some("Country")).unwrap();

    let mut provider = MemoryProvider::new();
    provider.add_table(spec.source_id(), table);

    let mut session = SelectionSession::new(&provider, &spec);
    session.open(Some("zea"), Some(2)).unwrap();
    assert_eq!(session.selected_row().unwrap().display_text, "New Zealand");
    session.confirm().unwrap();

    let payload = session.close().unwrap();
    assert_eq!(payload.lookup_value, Some(json!("NZ")));
}

#[test]
fn test_memory_and_sqlite_agree() {
    let (sqlite, _temp) = create_test_db();

    let people = MemoryTable::new(["id"])
        .with_row(json!({"id": 1, "name": "John Smith", "email": "john@example.com"}))
        .unwrap()
        .with_row(json!({"id": 2, "name": "Mark Jones", "email": "mark@example.com"}))
        .unwrap()
        .with_row(json!({"id": 3, "name": "Ann Lee", "email": "ann@example.com"}))
        .unwrap();
    let mut memory = MemoryProvider::new();
    memory.add_table("db:/crm/people", people);

    let mut registry = MultiSourceRegistry::new();
    registry
        .add_source("db:/crm/people")
        .set_display_attribute("name")
        .add_field("name");

    for text in ["", "o", "JO", "lee", "nobody"] {
        let from_sqlite = SearchAggregator::new(&sqlite)
            .run_search(text, 0, &registry)
            .unwrap();
        let from_memory = SearchAggregator::new(&memory)
            .run_search(text, 0, &registry)
            .unwrap();
        assert_eq!(from_sqlite, from_memory, "query {:?}", text);
    }
}

#[test]
fn test_unknown_table_propagates() {
    let (provider, _temp) = create_test_db();
    let mut registry =
        MultiSourceRegistry::from_data_sources(["db:/crm/people", "db:/crm/missing"]);
    for id in ["db:/crm/people", "db:/crm/missing"] {
        registry.get_source_mut(id).unwrap().add_field("name");
    }

    let result = SearchAggregator::new(&provider).run_search("jo", 2, &registry);
    assert!(matches!(result, Err(LookupError::UnknownSource(_))));
}

/// Open a session on "jo", highlight John Smith, then delete his row.
fn session_on_deleted_person<'a>(
    provider: &'a SqliteProvider,
    registry: &'a MultiSourceRegistry,
    fired: &'a std::cell::Cell<usize>,
) -> SelectionSession<'a, &'a SqliteProvider, MultiSourceRegistry> {
    let mut session =
        SelectionSession::new(provider, registry).on_select(move |_| fired.set(fired.get() + 1));
    session.open(Some("jo"), None).unwrap();
    let index = session
        .rows()
        .iter()
        .position(|r| r.display_text == "John Smith")
        .unwrap();
    session.select_row(index).unwrap();

    provider
        .with_connection(|conn| {
            conn.execute("DELETE FROM people WHERE id = 1", [])?;
            Ok(())
        })
        .unwrap();
    session
}

#[test]
fn test_cancel_after_record_deleted_still_dispatches() {
    let (provider, _temp) = create_test_db();
    let registry = crm_registry();
    let fired = std::cell::Cell::new(0);

    let mut session = session_on_deleted_person(&provider, &registry, &fired);
    let index = session.selected_index();
    session.cancel().unwrap();
    let payload = session.close().unwrap();

    assert_eq!(payload.query_text, "jo");
    assert_eq!(payload.selected_index, index);
    assert!(payload.record.is_none());
    assert_eq!(fired.get(), 1);
}

#[test]
fn test_confirm_after_record_deleted_reports_not_found() {
    let (provider, _temp) = create_test_db();
    let registry = crm_registry();
    let fired = std::cell::Cell::new(0);

    let mut session = session_on_deleted_person(&provider, &registry, &fired);
    session.confirm().unwrap();
    let err = session.close().unwrap_err();

    assert!(matches!(
        err,
        LookupError::RecordNotFound { ref source_id, ref key }
            if source_id == "db:/crm/people" && key == &vec!["1".to_string()]
    ));
    assert!(!err.is_integration_bug());
    assert_eq!(fired.get(), 0);
}
