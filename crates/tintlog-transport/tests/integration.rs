//! End-to-end tests for the transport manager with the bundled transports.

use std::sync::Arc;
use std::time::Duration;

use tintlog_core::{Level, LogRecord, SourceLocation, Value};
use tintlog_transport::{
    BatchConfig, FileConfig, FileTransport, HttpConfig, HttpTransport, Transport, TransportError,
    TransportManager, TransportOptions, TransportRecord,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manual() -> BatchConfig {
    BatchConfig::default().with_flush_interval(Duration::from_secs(3600))
}

fn read_lines(path: &std::path::Path) -> Vec<TransportRecord> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// ============================================================================
// Fan-out
// ============================================================================

#[tokio::test]
async fn file_and_http_receive_independent_copies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logs"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("out.ndjson");

    let manager = TransportManager::new();
    manager.add(
        "file",
        Arc::new(FileTransport::new("file", FileConfig::new(&file_path).batch(manual()))),
        TransportOptions::new(),
    );
    manager.add(
        "http",
        Arc::new(
            HttpTransport::new("http", HttpConfig::new(format!("{}/logs", server.uri())).batch(manual()))
                .unwrap(),
        ),
        TransportOptions::new().min_level(Level::Error),
    );

    manager.write(&LogRecord::new(Level::Info, "started"));
    manager.write(
        &LogRecord::new(Level::Error, "failed")
            .with_prefix("db")
            .with_location(SourceLocation::new("src/db.rs", 10, 3))
            .with_arg(Value::from("conn-7")),
    );

    assert!(manager.flush_all().await.is_empty());

    let lines = read_lines(&file_path);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].prefix.as_deref(), Some("db"));
    assert_eq!(lines[1].args, vec![serde_json::json!("conn-7")]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["logs"].as_array().unwrap().len(), 1);
    assert_eq!(body["logs"][0]["message"], "failed");
}

// ============================================================================
// Failure isolation
// ============================================================================

#[tokio::test]
async fn failing_endpoint_does_not_block_file_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("out.ndjson");

    let manager = TransportManager::new();
    manager.add(
        "http",
        Arc::new(HttpTransport::new("http", HttpConfig::new(server.uri()).batch(manual())).unwrap()),
        TransportOptions::new(),
    );
    manager.add(
        "file",
        Arc::new(FileTransport::new("file", FileConfig::new(&file_path).batch(manual()))),
        TransportOptions::new(),
    );

    manager.write(&LogRecord::new(Level::Warn, "retry me"));
    let errors = manager.flush_all().await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "http");
    assert!(matches!(errors[0].1, TransportError::Status { status: 500, .. }));
    assert_eq!(read_lines(&file_path).len(), 1);
    assert_eq!(manager.failures("http"), Some(1));
}

#[tokio::test]
async fn requeued_batch_is_delivered_once_endpoint_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let transport =
        Arc::new(HttpTransport::new("http", HttpConfig::new(server.uri()).batch(manual())).unwrap());
    let manager = TransportManager::new();
    manager.add("http", transport.clone(), TransportOptions::new());

    manager.write(&LogRecord::new(Level::Error, "first"));
    assert_eq!(manager.flush_all().await.len(), 1);
    assert_eq!(transport.pending_len(), 1);

    manager.write(&LogRecord::new(Level::Error, "second"));
    assert!(manager.flush_all().await.is_empty());
    assert_eq!(transport.pending_len(), 0);

    let requests = server.received_requests().await.unwrap();
    let last: serde_json::Value = serde_json::from_slice(&requests[requests.len() - 1].body).unwrap();
    assert_eq!(last["logs"][0]["message"], "first");
    assert_eq!(last["logs"][1]["message"], "second");
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn close_all_flushes_and_rejects_late_writes() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("out.ndjson");
    let transport = Arc::new(FileTransport::new("file", FileConfig::new(&file_path)));

    let manager = TransportManager::new();
    manager.add("file", transport.clone(), TransportOptions::new());
    manager.write(&LogRecord::new(Level::Info, "bye"));
    assert!(manager.close_all().await.is_empty());

    assert_eq!(read_lines(&file_path).len(), 1);
    assert!(manager.is_empty());
    assert_eq!(manager.write(&LogRecord::new(Level::Info, "late")), 0);
    let late = TransportRecord::from(&LogRecord::new(Level::Info, "late"));
    assert!(matches!(transport.write(late), Err(TransportError::Closed)));
}
