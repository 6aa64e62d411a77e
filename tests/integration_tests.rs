use async_trait::async_trait;
use databricks_connector::adapters::databricks::{DatabricksClientConfig, DatabricksConnector};
use databricks_connector::adapters::gcp_auth::StaticTokenProvider;
use databricks_connector::adapters::GcsUploader;
use databricks_connector::domain::model::{ColumnRow, ObjectKind};
use databricks_connector::domain::ports::{SourceConnector, Uploader};
use databricks_connector::{ConnectorConfig, EtlError, MetadataPipeline, OutputMode, Result};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const HOST: &str = "adb-123.azuredatabricks.net";

fn config(output_dir: &Path, output: OutputMode, min_expected_entries: Option<usize>) -> ConnectorConfig {
    ConnectorConfig {
        target_project_id: "my-project".to_string(),
        target_location_id: "us-central1".to_string(),
        target_entry_group_id: "databricks-eg".to_string(),
        server_hostname: HOST.to_string(),
        http_path: "/sql/1.0/warehouses/abc123".to_string(),
        access_token_secret: "databricks-token".to_string(),
        output,
        min_expected_entries,
        output_dir: output_dir.to_path_buf(),
    }
}

fn read_lines(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn statement_result(columns: &[&str], rows: Value) -> Value {
    let columns: Vec<Value> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| json!({"name": name, "position": i}))
        .collect();
    json!({
        "statement_id": "st-1",
        "status": {"state": "SUCCEEDED"},
        "manifest": {"schema": {"columns": columns}},
        "result": {"data_array": rows}
    })
}

/// One catalog `C1`, schema `S1`, table `T1(id INT NOT NULL)` and view `V1(name STRING)`.
fn mock_databricks(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/api/2.0/sql/sessions");
        then.status(200).json_body(json!({"session_id": "sess-1"}));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/2.0/sql/statements")
            .body_contains("information_schema.catalogs");
        then.status(200)
            .json_body(statement_result(&["catalog_name"], json!([["C1"]])));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/2.0/sql/statements")
            .body_contains("information_schema.schemata");
        then.status(200)
            .json_body(statement_result(&["schema_name"], json!([["S1"]])));
    });

    let column_names = ["table_name", "column_name", "data_type", "is_nullable"];
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/2.0/sql/statements")
            .body_contains("t.table_type = 'BASE TABLE'");
        then.status(200)
            .json_body(statement_result(&column_names, json!([["T1", "id", "INT", "NO"]])));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/2.0/sql/statements")
            .body_contains("t.table_type = 'VIEW'");
        then.status(200)
            .json_body(statement_result(&column_names, json!([["V1", "name", "STRING", "YES"]])));
    });
}

async fn connect(server: &MockServer) -> DatabricksConnector {
    let mut client_config = DatabricksClientConfig::with_base_url(server.base_url(), "abc123");
    client_config.poll_interval = Duration::from_millis(10);
    DatabricksConnector::connect(reqwest::Client::new(), client_config, "dapi-test".to_string())
        .await
        .unwrap()
}

fn gcs_uploader(server: &MockServer) -> GcsUploader {
    GcsUploader::with_base_url(
        reqwest::Client::new(),
        server.base_url(),
        Arc::new(StaticTokenProvider::new("ya29.test")),
    )
}

#[tokio::test]
async fn test_end_to_end_extract_and_upload() {
    let temp_dir = TempDir::new().unwrap();
    let databricks = MockServer::start();
    mock_databricks(&databricks);
    let close_mock = databricks.mock(|when, then| {
        when.method(DELETE).path("/api/2.0/sql/sessions/sess-1");
        then.status(200).json_body(json!({}));
    });

    let gcs = MockServer::start();
    let upload_mock = gcs.mock(|when, then| {
        when.method(POST)
            .path("/upload/storage/v1/b/metadata-imports/o")
            .query_param("name", format!("databricks/databricks-{}.jsonl", HOST));
        then.status(200).json_body(json!({}));
    });

    let output = OutputMode::Bucket {
        bucket: "metadata-imports".to_string(),
        folder: Some("databricks".to_string()),
    };
    let pipeline = MetadataPipeline::new(
        config(temp_dir.path(), output, Some(2)),
        connect(&databricks).await,
        gcs_uploader(&gcs),
    );

    let report = pipeline.run().await.unwrap();

    upload_mock.assert();
    close_mock.assert();
    assert_eq!(report.entries_count, 2);
    assert_eq!(report.lines_written, 4);
    assert_eq!(
        report.uploaded_to.as_deref(),
        Some("gs://metadata-imports/databricks/databricks-adb-123.azuredatabricks.net.jsonl")
    );

    let lines = read_lines(&report.output_path);
    assert_eq!(lines.len(), 4);

    let entry_types: Vec<&str> = lines
        .iter()
        .map(|line| line["entry"]["entry_type"].as_str().unwrap())
        .collect();
    assert_eq!(
        entry_types,
        vec![
            "projects/my-project/locations/us-central1/entryTypes/databricks-catalog",
            "projects/my-project/locations/us-central1/entryTypes/databricks-schema",
            "projects/my-project/locations/us-central1/entryTypes/databricks-table",
            "projects/my-project/locations/us-central1/entryTypes/databricks-view",
        ]
    );

    let table_fields = &lines[2]["entry"]["aspects"]["dataplex-types.global.schema"]["data"]["fields"];
    assert_eq!(table_fields[0]["name"], "id");
    assert_eq!(table_fields[0]["dataType"], "INT");
    assert_eq!(table_fields[0]["metadataType"], "NUMBER");
    assert_eq!(table_fields[0]["mode"], "REQUIRED");

    let view_fields = &lines[3]["entry"]["aspects"]["dataplex-types.global.schema"]["data"]["fields"];
    assert_eq!(view_fields[0]["metadataType"], "STRING");
    assert_eq!(view_fields[0]["mode"], "NULLABLE");

    assert_eq!(
        lines[3]["entry"]["fully_qualified_name"],
        "databricks:`adb-123.azuredatabricks.net`.C1.S1.V1"
    );
    assert_eq!(lines[0]["entry"]["parent_entry"], "");
    assert_eq!(lines[3]["update_mask"], json!(["aspects"]));
}

#[tokio::test]
async fn test_below_threshold_keeps_file_local() {
    let temp_dir = TempDir::new().unwrap();
    let databricks = MockServer::start();
    mock_databricks(&databricks);

    let gcs = MockServer::start();
    let upload_mock = gcs.mock(|when, then| {
        when.method(POST);
        then.status(200);
    });

    let output = OutputMode::Bucket {
        bucket: "metadata-imports".to_string(),
        folder: None,
    };
    let pipeline = MetadataPipeline::new(
        config(temp_dir.path(), output, Some(10)),
        connect(&databricks).await,
        gcs_uploader(&gcs),
    );

    let report = pipeline.run().await.unwrap();

    upload_mock.assert_hits(0);
    assert!(report.uploaded_to.is_none());
    assert_eq!(read_lines(&report.output_path).len(), 4);
}

struct FailingSchemas {
    closed: Arc<Mutex<bool>>,
}

#[async_trait]
impl SourceConnector for FailingSchemas {
    async fn list_catalogs(&self) -> Result<Vec<String>> {
        Ok(vec!["C1".to_string()])
    }

    async fn list_schemas(&self, _catalog: &str) -> Result<Vec<String>> {
        Err(EtlError::QueryError {
            query: "SELECT schema_name FROM `C1`.information_schema.schemata".to_string(),
            message: "PERMISSION_DENIED".to_string(),
        })
    }

    async fn fetch_columns(&self, _catalog: &str, _schema: &str, _kind: ObjectKind) -> Result<Vec<ColumnRow>> {
        Ok(vec![])
    }

    async fn close(&self) -> Result<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

struct RecordingUploader {
    calls: Arc<Mutex<usize>>,
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn upload(&self, _local_file: &Path, bucket: &str, _folder: Option<&str>) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        Ok(format!("gs://{}", bucket))
    }
}

#[tokio::test]
async fn test_schema_listing_failure_aborts_without_upload() {
    let temp_dir = TempDir::new().unwrap();
    let closed = Arc::new(Mutex::new(false));
    let calls = Arc::new(Mutex::new(0));

    let output = OutputMode::Bucket {
        bucket: "metadata-imports".to_string(),
        folder: None,
    };
    let pipeline = MetadataPipeline::new(
        config(temp_dir.path(), output, None),
        FailingSchemas {
            closed: closed.clone(),
        },
        RecordingUploader {
            calls: calls.clone(),
        },
    );

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, EtlError::QueryError { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(*closed.lock().unwrap());
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_local_only_never_uploads() {
    let temp_dir = TempDir::new().unwrap();
    let databricks = MockServer::start();
    mock_databricks(&databricks);
    let calls = Arc::new(Mutex::new(0));

    let pipeline = MetadataPipeline::new(
        config(temp_dir.path(), OutputMode::LocalOnly, Some(100)),
        connect(&databricks).await,
        RecordingUploader {
            calls: calls.clone(),
        },
    );

    let report = pipeline.run().await.unwrap();

    assert_eq!(*calls.lock().unwrap(), 0);
    assert_eq!(
        report.output_path,
        temp_dir.path().join("databricks-adb-123.azuredatabricks.net.jsonl")
    );
}
