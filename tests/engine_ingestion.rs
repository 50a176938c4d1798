use std::sync::Arc;

use datalake_ingest::db::DisabledConnector;
use datalake_ingest::ingestion::{read_parquet, IngestionEngine, SourceDescriptor};
use datalake_ingest::paths::TargetPath;
use datalake_ingest::storage::MemoryObjectStore;
use datalake_ingest::IngestionError;

fn engine_with(objects: &[(&str, &str)]) -> (Arc<MemoryObjectStore>, IngestionEngine) {
    let store = Arc::new(MemoryObjectStore::new());
    for (key, bytes) in objects {
        store.insert("landing", key, *bytes);
    }
    let engine = IngestionEngine::new(store.clone(), Arc::new(DisabledConnector));
    (store, engine)
}

fn target(name: &str) -> TargetPath {
    TargetPath::new("gs", "lake", "raw", name).unwrap()
}

#[test]
fn delimited_output_is_all_strings_with_order_preserved() {
    let csv = std::fs::read_to_string("tests/fixtures/people.csv").unwrap();
    let (store, engine) = engine_with(&[("in/people.csv", csv.as_str())]);

    let stats = engine
        .ingest_delimited("gs://landing/in/people.csv", &target("people.parquet"))
        .unwrap();
    assert_eq!(stats.rows, 2);
    assert_eq!(stats.columns, 4);

    let out = read_parquet(store.object("lake", "raw/people.parquet").unwrap()).unwrap();
    assert_eq!(out.column_names(), ["id", "name", "score", "active"]);
    assert_eq!(out.row(0).unwrap(), vec!["1", "Ada", "98.5", "true"]);
    assert_eq!(out.row(1).unwrap(), vec!["2", "Grace", "", "false"]);
}

#[test]
fn delimited_rejects_other_extensions_before_reading() {
    let (store, engine) = engine_with(&[("in/people.xlsx", "id\n1\n")]);

    let err = engine
        .ingest_delimited("gs://landing/in/people.xlsx", &target("people.parquet"))
        .unwrap_err();
    match err {
        IngestionError::InvalidSourceType { extension, expected, .. } => {
            assert_eq!(extension, "xlsx");
            assert_eq!(expected, &["csv"]);
        }
        other => panic!("expected InvalidSourceType, got {other:?}"),
    }
    assert!(store.object("lake", "raw/people.parquet").is_none());
}

#[test]
fn delimited_extension_check_is_case_insensitive() {
    let (_, engine) = engine_with(&[("in/UPPER.CSV", "a\n1\n")]);
    engine
        .ingest_delimited("gs://landing/in/UPPER.CSV", &target("upper.parquet"))
        .unwrap();
}

#[test]
fn spreadsheet_rejects_txt() {
    let (_, engine) = engine_with(&[("in/notes.txt", "hello")]);
    let err = engine
        .ingest_spreadsheet("gs://landing/in/notes.txt", &target("notes.parquet"))
        .unwrap_err();
    assert!(matches!(err, IngestionError::InvalidSourceType { .. }));
}

#[test]
fn spreadsheet_accepts_xlsx_and_xls_extensions() {
    // Garbage content: the extension check passes, the workbook parse does not.
    let (_, engine) = engine_with(&[("in/a.xlsx", "not a workbook"), ("in/b.xls", "not a workbook")]);

    for uri in ["gs://landing/in/a.xlsx", "gs://landing/in/b.xls"] {
        let err = engine.ingest_spreadsheet(uri, &target("x.parquet")).unwrap_err();
        assert!(
            matches!(err, IngestionError::SourceRead { .. }),
            "{uri}: expected SourceRead, got {err:?}"
        );
    }
}

#[test]
fn missing_source_is_a_read_error() {
    let (store, engine) = engine_with(&[]);
    let err = engine
        .ingest_delimited("gs://landing/in/nope.csv", &target("nope.parquet"))
        .unwrap_err();
    assert!(matches!(err, IngestionError::SourceRead { .. }));
    assert!(store.keys().is_empty());
}

#[test]
fn malformed_source_uri_is_a_read_error() {
    let (store, engine) = engine_with(&[("in/people.csv", "id\n1\n")]);
    let err = engine
        .ingest_delimited("landing/in/people.csv", &target("people.parquet"))
        .unwrap_err();
    match err {
        IngestionError::SourceRead { uri, source } => {
            assert_eq!(uri, "landing/in/people.csv");
            assert!(source.to_string().contains("has no scheme"));
        }
        other => panic!("expected SourceRead, got {other:?}"),
    }
    assert!(store.object("lake", "raw/people.parquet").is_none());
}

#[test]
fn unparseable_source_writes_nothing() {
    let (store, engine) = engine_with(&[("in/bad.csv", "id,name\n1,Ada,extra\n")]);
    let err = engine
        .ingest_delimited("gs://landing/in/bad.csv", &target("bad.parquet"))
        .unwrap_err();
    assert!(matches!(err, IngestionError::SourceRead { .. }));
    assert!(store.object("lake", "raw/bad.parquet").is_none());
}

#[test]
fn ingest_dispatches_on_descriptor() {
    let (store, engine) = engine_with(&[("in/people.csv", "id\n1\n2\n")]);
    let source = SourceDescriptor::file("gs://landing/in/people.csv").unwrap();

    let stats = engine.ingest(&source, &target("People.parquet")).unwrap();
    assert_eq!(stats.rows, 2);
    assert!(store.object("lake", "raw/people.parquet").is_some());
}

#[test]
fn query_without_backend_reports_disabled_feature() {
    let (_, engine) = engine_with(&[]);
    let err = engine
        .ingest_query("select * from orders", "postgresql://db/sales", &target("orders"), None)
        .unwrap_err();
    assert!(matches!(err, IngestionError::QueryExecution { .. }));
}
