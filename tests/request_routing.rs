use std::sync::{Arc, Mutex};

use datalake_ingest::ingestion::{FileKind, IngestionObserver, IngestionSeverity, SourceDescriptor};
use datalake_ingest::paths::{derive_target_object_name, Location};
use datalake_ingest::router::{extract_table_name, IngestRequest, Router};
use datalake_ingest::storage::MemoryObjectStore;
use datalake_ingest::IngestionError;

#[derive(Default)]
struct RecordingObserver {
    skipped: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_message(&self, severity: IngestionSeverity, message: &str) {
        if severity == IngestionSeverity::Warning {
            self.warnings.lock().unwrap().push(message.to_string());
        }
    }

    fn on_skipped(&self, object: &str) {
        self.skipped.lock().unwrap().push(object.to_string());
    }
}

const JSON: &str = "application/json";

#[test]
fn derive_target_object_name_examples() {
    assert_eq!(
        derive_target_object_name("orders_2024.CSV", "csv", "parquet"),
        "orders_2024.parquet"
    );
    assert_eq!(derive_target_object_name("Budget.xls", "xls", "parquet"), "budget.parquet");
}

#[test]
fn table_name_extraction() {
    assert_eq!(extract_table_name("SELECT * FROM Orders WHERE id=1"), "Orders");
    assert_eq!(extract_table_name("select a from\nCustomers"), "");
}

#[test]
fn parses_file_request() {
    let req = IngestRequest::parse(JSON, br#"{"source_loc": "landing/in", "target_loc": "lake/raw/"}"#).unwrap();
    assert_eq!(
        req,
        IngestRequest::File {
            source: Location::parse("landing/in").unwrap(),
            target: Location::parse("lake/raw").unwrap(),
        }
    );
    assert_eq!(req.target().to_string(), "lake/raw");
}

#[test]
fn parses_db_request_with_credentials() {
    let body = br#"{"query": "select * from orders", "db_url": "postgresql://db/sales",
                    "target_loc": "lake/raw", "credentials": {"user": "etl"}}"#;
    match IngestRequest::parse("application/json; charset=utf-8", body).unwrap() {
        IngestRequest::Db {
            query,
            db_url,
            credentials,
            ..
        } => {
            assert_eq!(query, "select * from orders");
            assert_eq!(db_url, "postgresql://db/sales");
            assert!(credentials.is_some());
        }
        other => panic!("expected db request, got {other:?}"),
    }
}

#[test]
fn rejects_unsupported_content_type() {
    let err = IngestRequest::parse("text/plain", br#"{"source_loc": "a", "target_loc": "b"}"#).unwrap_err();
    assert!(matches!(err, IngestionError::ParameterValidation { .. }));
    assert!(err.to_string().contains("text/plain"));
}

#[test]
fn rejects_missing_fields() {
    for body in [
        br#"{"target_loc": "lake"}"#.as_slice(),
        br#"{"source_loc": "landing"}"#.as_slice(),
        br#"{"query": "select 1", "target_loc": "lake"}"#.as_slice(),
        br#"{"source_loc": "", "target_loc": "lake"}"#.as_slice(),
        br#"[1, 2]"#.as_slice(),
        b"not json".as_slice(),
    ] {
        let err = IngestRequest::parse(JSON, body).unwrap_err();
        assert!(
            matches!(err, IngestionError::ParameterValidation { .. }),
            "body {:?} gave {err:?}",
            String::from_utf8_lossy(body)
        );
    }
}

#[test]
fn rejects_ambiguous_body() {
    let body = br#"{"source_loc": "landing", "target_loc": "lake", "query": "select 1", "db_url": "x://y"}"#;
    let err = IngestRequest::parse(JSON, body).unwrap_err();
    assert!(err.to_string().contains("mixes"));
}

#[test]
fn plan_lists_flat_classifies_and_skips() {
    let store = Arc::new(MemoryObjectStore::new());
    for key in [
        "in/b.xlsx",
        "in/a.csv",
        "in/notes.txt",
        "in/",
        "in/nested/deep.csv",
        "in/Orders.XLS",
        "other/x.csv",
    ] {
        store.insert("landing", key, "x");
    }
    let obs = Arc::new(RecordingObserver::default());
    let router = Router::new(store, "gs").with_observer(obs.clone());

    let req = IngestRequest::parse(JSON, br#"{"source_loc": "landing/in", "target_loc": "Lake/Raw"}"#).unwrap();
    let jobs = router.plan(&req).unwrap();

    let planned: Vec<(String, String)> = jobs
        .iter()
        .map(|j| (j.source.describe(), j.target.to_string()))
        .collect();
    assert_eq!(
        planned,
        vec![
            ("gs://landing/in/Orders.XLS".to_string(), "gs://lake/raw/orders.parquet".to_string()),
            ("gs://landing/in/a.csv".to_string(), "gs://lake/raw/a.parquet".to_string()),
            ("gs://landing/in/b.xlsx".to_string(), "gs://lake/raw/b.parquet".to_string()),
        ]
    );
    assert!(matches!(
        jobs[1].source,
        SourceDescriptor::File {
            kind: FileKind::Delimited,
            ..
        }
    ));
    assert_eq!(*obs.skipped.lock().unwrap(), vec!["in/notes.txt".to_string()]);
}

#[test]
fn plan_at_bucket_root_has_no_double_slash() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("landing", "top.csv", "x");
    let router = Router::new(store, "gs");

    let req = IngestRequest::parse(JSON, br#"{"source_loc": "landing", "target_loc": "lake"}"#).unwrap();
    let jobs = router.plan(&req).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].target.to_string(), "gs://lake/top.parquet");
}

#[test]
fn db_plan_names_object_after_table() {
    let router = Router::new(Arc::new(MemoryObjectStore::new()), "gs");
    let req = IngestRequest::parse(
        JSON,
        br#"{"query": "SELECT * FROM Orders WHERE id=1", "db_url": "postgresql://db/sales", "target_loc": "lake/raw"}"#,
    )
    .unwrap();
    let jobs = router.plan(&req).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].target.to_string(), "gs://lake/raw/orders.parquet");
}

#[test]
fn db_plan_falls_back_when_no_table_name() {
    let obs = Arc::new(RecordingObserver::default());
    let router = Router::new(Arc::new(MemoryObjectStore::new()), "gs").with_observer(obs.clone());
    let req = IngestRequest::parse(
        JSON,
        br#"{"query": "select a from\nCustomers", "db_url": "postgresql://db/sales", "target_loc": "lake/raw"}"#,
    )
    .unwrap();
    let jobs = router.plan(&req).unwrap();
    assert_eq!(jobs[0].target.to_string(), "gs://lake/raw/query_result.parquet");
    assert_eq!(obs.warnings.lock().unwrap().len(), 1);
}
