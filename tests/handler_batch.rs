use std::sync::{Arc, Mutex};

use datalake_ingest::config::HandlerConfig;
use datalake_ingest::db::DisabledConnector;
use datalake_ingest::handler::Handler;
use datalake_ingest::ingestion::{read_parquet, IngestionObserver, IngestionSeverity, NoopObserver};
use datalake_ingest::storage::{LocalObjectStore, MemoryObjectStore};
use datalake_ingest::IngestionError;

const JSON: &str = "application/json";
const FILE_REQUEST: &[u8] = br#"{"source_loc": "landing/in", "target_loc": "lake/raw"}"#;

#[derive(Default)]
struct MessageLog(Mutex<Vec<(IngestionSeverity, String)>>);

impl IngestionObserver for MessageLog {
    fn on_message(&self, severity: IngestionSeverity, message: &str) {
        self.0.lock().unwrap().push((severity, message.to_string()));
    }
}

fn handler(store: Arc<MemoryObjectStore>, observer: Arc<dyn IngestionObserver>) -> Handler {
    Handler::new(&HandlerConfig::default(), store, Arc::new(DisabledConnector), observer)
}

#[test]
fn converts_every_supported_file() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("landing", "in/a.csv", "id,name\n1,Ada\n");
    store.insert("landing", "in/B.CSV", "id\n2\n3\n");
    store.insert("landing", "in/readme.md", "# skip me");
    let log = Arc::new(MessageLog::default());

    let message = handler(store.clone(), log.clone()).handle(JSON, FILE_REQUEST).unwrap();

    assert_eq!(message, "Parquet file(s) uploaded to lake/raw");
    let b = read_parquet(store.object("lake", "raw/b.parquet").unwrap()).unwrap();
    assert_eq!(b.column("id").unwrap(), ["2", "3"]);
    assert!(store.object("lake", "raw/a.parquet").is_some());
    assert!(store.object("lake", "raw/readme.md").is_none());

    let messages = log.0.lock().unwrap().clone();
    assert!(messages.contains(&(IngestionSeverity::Info, "Parameters acquired, resuming...".to_string())));
    assert!(messages.contains(&(IngestionSeverity::Info, "Converted 2 file(s) to parquet".to_string())));
}

#[test]
fn batch_stops_at_first_failure() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("landing", "in/a.csv", "id\n1\n");
    store.insert("landing", "in/b.csv", b"id\n\xff\xfe\n".to_vec());
    store.insert("landing", "in/c.csv", "id\n3\n");

    let err = handler(store.clone(), Arc::new(NoopObserver))
        .handle(JSON, FILE_REQUEST)
        .unwrap_err();

    match &err {
        IngestionError::SourceRead { uri, .. } => assert_eq!(uri, "gs://landing/in/b.csv"),
        other => panic!("expected SourceRead for b.csv, got {other:?}"),
    }
    assert!(store.object("lake", "raw/a.parquet").is_some());
    assert!(store.object("lake", "raw/b.parquet").is_none());
    assert!(store.object("lake", "raw/c.parquet").is_none());
}

#[test]
fn invalid_request_is_logged_and_nothing_runs() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert("landing", "in/a.csv", "id\n1\n");
    let log = Arc::new(MessageLog::default());

    let err = handler(store.clone(), log.clone())
        .handle("text/csv", FILE_REQUEST)
        .unwrap_err();

    assert!(matches!(err, IngestionError::ParameterValidation { .. }));
    let messages = log.0.lock().unwrap().clone();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, IngestionSeverity::Error);
    assert_eq!(store.keys().len(), 1);
}

#[test]
fn missing_source_bucket_is_a_read_error() {
    let root = std::env::temp_dir().join(format!("datalake_ingest_handler_{}", std::process::id()));
    std::fs::create_dir_all(&root).unwrap();
    let config = HandlerConfig {
        storage_root: root.clone(),
        ..HandlerConfig::default()
    };
    let handler = Handler::new(
        &config,
        Arc::new(LocalObjectStore::new(&root)),
        Arc::new(DisabledConnector),
        Arc::new(NoopObserver),
    );

    let err = handler.handle(JSON, FILE_REQUEST).unwrap_err();
    let _ = std::fs::remove_dir_all(&root);
    assert!(matches!(err, IngestionError::SourceRead { .. }));
}

#[test]
fn local_store_end_to_end() {
    let root = std::env::temp_dir().join(format!("datalake_ingest_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(root.join("landing").join("in")).unwrap();
    std::fs::copy("tests/fixtures/people.csv", root.join("landing").join("in").join("People.csv")).unwrap();

    let config = HandlerConfig {
        storage_root: root.clone(),
        ..HandlerConfig::default()
    };
    let message = Handler::from_config(&config).handle(JSON, FILE_REQUEST).unwrap();
    let written = std::fs::read(root.join("lake").join("raw").join("people.parquet")).unwrap();
    let _ = std::fs::remove_dir_all(&root);

    assert_eq!(message, "Parquet file(s) uploaded to lake/raw");
    let frame = read_parquet(written).unwrap();
    assert_eq!(frame.row_count(), 2);
    assert_eq!(frame.column_names(), ["id", "name", "score", "active"]);
}
