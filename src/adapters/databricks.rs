//! Databricks source connector over the SQL Statement Execution API.
//!
//! Queries run against `information_schema` on a SQL warehouse, inline with
//! `JSON_ARRAY` results. One session is opened in [`DatabricksConnector::connect`]
//! and released by [`SourceConnector::close`].

use crate::config::ConnectorConfig;
use crate::domain::model::{ColumnRow, ObjectKind, SOURCE_TYPE};
use crate::domain::ports::SourceConnector;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct DatabricksClientConfig {
    /// Workspace URL, `https://<server_hostname>`.
    pub base_url: String,
    pub warehouse_id: String,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    /// Server-side wait before the first response, `"5s"`..`"50s"`.
    pub wait_timeout: String,
}

impl DatabricksClientConfig {
    pub fn from_connector_config(config: &ConnectorConfig) -> Result<Self> {
        let warehouse_id = config
            .warehouse_id()
            .ok_or_else(|| EtlError::ConnectorInitError {
                source_type: SOURCE_TYPE.to_string(),
                message: format!("no warehouse id in http_path '{}'", config.http_path),
            })?;

        Ok(Self {
            base_url: format!("https://{}", config.server_hostname),
            warehouse_id: warehouse_id.to_string(),
            ..Self::with_base_url("", "")
        })
    }

    pub fn with_base_url(base_url: impl Into<String>, warehouse_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            warehouse_id: warehouse_id.into(),
            poll_interval: Duration::from_millis(500),
            poll_timeout: Duration::from_secs(600),
            wait_timeout: "30s".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    warehouse_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct ExecuteStatementRequest<'a> {
    warehouse_id: &'a str,
    statement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    disposition: &'static str,
    format: &'static str,
    wait_timeout: &'a str,
    on_wait_timeout: &'static str,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    statement_id: String,
    status: StatementStatus,
    #[serde(default)]
    manifest: Option<ResultManifest>,
    #[serde(default)]
    result: Option<ResultData>,
}

#[derive(Debug, Deserialize)]
struct StatementStatus {
    state: StatementState,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultManifest {
    schema: ResultSchema,
}

#[derive(Debug, Deserialize)]
struct ResultSchema {
    #[serde(default)]
    columns: Vec<ColumnInfo>,
}

#[derive(Debug, Deserialize)]
struct ColumnInfo {
    name: String,
    #[serde(default)]
    position: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultData {
    #[serde(default)]
    data_array: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    next_chunk_index: Option<i64>,
}

/// Column names and string cells of a finished statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    /// Case-insensitive column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    fn require_column(&self, query: &str, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| EtlError::QueryError {
            query: query.to_string(),
            message: format!("result has no column '{}'", name),
        })
    }

    /// Non-null values of one column, in row order.
    pub fn strings(&self, query: &str, name: &str) -> Result<Vec<String>> {
        let index = self.require_column(query, name)?;
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.get(index).cloned().flatten())
            .collect())
    }
}

/// Back-quoted identifier for catalog names in `FROM` clauses.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Single-quoted string literal with backslash escapes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub fn catalogs_query() -> String {
    "SELECT catalog_name FROM information_schema.catalogs".to_string()
}

pub fn schemas_query(catalog: &str) -> String {
    format!(
        "SELECT schema_name FROM {}.information_schema.schemata \
         WHERE schema_name != 'information_schema'",
        quote_identifier(catalog)
    )
}

/// Columns joined with tables so only objects of `kind` are returned.
pub fn columns_query(catalog: &str, schema: &str, kind: ObjectKind) -> String {
    let catalog = quote_identifier(catalog);
    format!(
        "SELECT c.table_name, c.column_name, c.data_type, c.is_nullable \
         FROM {catalog}.information_schema.columns c \
         JOIN {catalog}.information_schema.tables t \
         ON c.table_catalog = t.table_catalog \
         AND c.table_schema = t.table_schema \
         AND c.table_name = t.table_name \
         WHERE c.table_schema = {schema} \
         AND t.table_type = {table_type} \
         ORDER BY c.table_name, c.ordinal_position",
        catalog = catalog,
        schema = quote_literal(schema),
        table_type = quote_literal(kind.native_table_type()),
    )
}

pub struct DatabricksConnector {
    client: Client,
    config: DatabricksClientConfig,
    token: String,
    session_id: Mutex<Option<String>>,
}

impl fmt::Debug for DatabricksConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabricksConnector")
            .field("config", &self.config)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl DatabricksConnector {
    /// Opens the session. Any failure here is a connector initialisation error.
    pub async fn connect(client: Client, config: DatabricksClientConfig, token: String) -> Result<Self> {
        let connector = Self {
            client,
            config,
            token,
            session_id: Mutex::new(None),
        };

        let session_id = connector
            .create_session()
            .await
            .map_err(|e| EtlError::ConnectorInitError {
                source_type: SOURCE_TYPE.to_string(),
                message: e.to_string(),
            })?;
        tracing::debug!("Created Databricks session {}", session_id);

        if let Ok(mut guard) = connector.session_id.lock() {
            *guard = Some(session_id);
        }

        Ok(connector)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/2.0/sql{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    fn current_session(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|guard| guard.clone())
    }

    async fn create_session(&self) -> Result<String> {
        let request = CreateSessionRequest {
            warehouse_id: &self.config.warehouse_id,
        };
        let response = self
            .authorized(self.client.post(self.api_url("/sessions")))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::ConfigError {
                message: format!("session creation failed (HTTP {}): {}", status, body),
            });
        }

        let session: CreateSessionResponse = response.json().await?;
        Ok(session.session_id)
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        builder: RequestBuilder,
    ) -> Result<T> {
        let query_error = |message: String| EtlError::QueryError {
            query: query.to_string(),
            message,
        };

        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| query_error(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| query_error(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(query_error(format!("HTTP {}: {}", status, body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| query_error(format!("failed to parse response: {} - body: {}", e, body)))
    }

    async fn wait_for_completion(&self, query: &str, mut response: StatementResponse) -> Result<StatementResponse> {
        let start = Instant::now();

        loop {
            let state = response.status.state;
            match state {
                StatementState::Succeeded => return Ok(response),
                StatementState::Closed if response.result.is_some() => return Ok(response),
                StatementState::Failed | StatementState::Canceled | StatementState::Closed => {
                    let message = response
                        .status
                        .error
                        .as_ref()
                        .map(|e| {
                            format!(
                                "{}: {}",
                                e.error_code.as_deref().unwrap_or("ERROR"),
                                e.message.as_deref().unwrap_or("unknown error")
                            )
                        })
                        .unwrap_or_else(|| format!("statement {:?}", state));
                    return Err(EtlError::QueryError {
                        query: query.to_string(),
                        message,
                    });
                }
                StatementState::Pending | StatementState::Running => {
                    if start.elapsed() > self.config.poll_timeout {
                        self.cancel(&response.statement_id).await;
                        return Err(EtlError::QueryError {
                            query: query.to_string(),
                            message: "statement execution timed out".to_string(),
                        });
                    }

                    tokio::time::sleep(self.config.poll_interval).await;

                    let url = self.api_url(&format!("/statements/{}", response.statement_id));
                    response = self.send_json(query, self.client.get(url)).await?;
                }
            }
        }
    }

    async fn cancel(&self, statement_id: &str) {
        let url = self.api_url(&format!("/statements/{}/cancel", statement_id));
        if let Err(e) = self.authorized(self.client.post(url)).send().await {
            tracing::warn!("Failed to cancel statement {}: {}", statement_id, e);
        }
    }

    /// Runs `sql` to completion and collects every result chunk.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        tracing::debug!("Executing statement: {}", sql);

        let session_id = self.current_session();
        let request = ExecuteStatementRequest {
            warehouse_id: &self.config.warehouse_id,
            statement: sql,
            session_id: session_id.as_deref(),
            disposition: "INLINE",
            format: "JSON_ARRAY",
            wait_timeout: &self.config.wait_timeout,
            on_wait_timeout: "CONTINUE",
        };

        let response: StatementResponse = self
            .send_json(sql, self.client.post(self.api_url("/statements")).json(&request))
            .await?;
        let response = self.wait_for_completion(sql, response).await?;

        let mut columns: Vec<ColumnInfo> = response
            .manifest
            .map(|manifest| manifest.schema.columns)
            .unwrap_or_default();
        columns.sort_by_key(|column| column.position.unwrap_or(usize::MAX));

        let mut result = QueryResult {
            columns: columns.into_iter().map(|column| column.name).collect(),
            rows: Vec::new(),
        };

        let mut chunk = response.result.unwrap_or_default();
        loop {
            result.rows.extend(chunk.data_array.take().unwrap_or_default());

            let Some(next) = chunk.next_chunk_index else {
                break;
            };
            let url = self.api_url(&format!(
                "/statements/{}/result/chunks/{}",
                response.statement_id, next
            ));
            chunk = self.send_json(sql, self.client.get(url)).await?;
        }

        tracing::debug!("Statement {} returned {} rows", response.statement_id, result.rows.len());
        Ok(result)
    }
}

#[async_trait]
impl SourceConnector for DatabricksConnector {
    async fn list_catalogs(&self) -> Result<Vec<String>> {
        let query = catalogs_query();
        self.execute(&query).await?.strings(&query, "catalog_name")
    }

    async fn list_schemas(&self, catalog: &str) -> Result<Vec<String>> {
        let query = schemas_query(catalog);
        let schemas = self.execute(&query).await?.strings(&query, "schema_name")?;
        // 部分工作區回傳大寫名稱，這裡再過濾一次
        Ok(schemas
            .into_iter()
            .filter(|schema| !schema.eq_ignore_ascii_case("information_schema"))
            .collect())
    }

    async fn fetch_columns(
        &self,
        catalog: &str,
        schema: &str,
        kind: ObjectKind,
    ) -> Result<Vec<ColumnRow>> {
        let query = columns_query(catalog, schema, kind);
        let result = self.execute(&query).await?;

        let table = result.require_column(&query, "table_name")?;
        let column = result.require_column(&query, "column_name")?;
        let data_type = result.require_column(&query, "data_type")?;
        let is_nullable = result.require_column(&query, "is_nullable")?;

        let cell = |row: &[Option<String>], index: usize| -> Option<String> {
            row.get(index).cloned().flatten()
        };

        let mut rows = Vec::with_capacity(result.rows.len());
        for row in &result.rows {
            let (Some(table_name), Some(column_name)) = (cell(row, table), cell(row, column)) else {
                tracing::warn!("Skipping column row without table or column name in {}.{}", catalog, schema);
                continue;
            };
            rows.push(ColumnRow {
                table_name,
                column_name,
                data_type: cell(row, data_type).unwrap_or_default(),
                is_nullable: cell(row, is_nullable).unwrap_or_default(),
            });
        }

        Ok(rows)
    }

    async fn close(&self) -> Result<()> {
        let session_id = self.session_id.lock().ok().and_then(|mut guard| guard.take());
        let Some(session_id) = session_id else {
            return Ok(());
        };

        let url = self.api_url(&format!("/sessions/{}", session_id));
        // 盡力而為，關閉失敗不影響結果
        match self.authorized(self.client.delete(url)).send().await {
            Ok(_) => tracing::debug!("Closed Databricks session {}", session_id),
            Err(e) => tracing::warn!("Failed to close Databricks session {}: {}", session_id, e),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_config(server: &MockServer) -> DatabricksClientConfig {
        let mut config = DatabricksClientConfig::with_base_url(server.base_url(), "wh-1");
        config.poll_interval = Duration::from_millis(10);
        config
    }

    fn mock_session(server: &MockServer) {
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/2.0/sql/sessions")
                .header("Authorization", "Bearer dapi-test")
                .json_body(json!({"warehouse_id": "wh-1"}));
            then.status(200).json_body(json!({"session_id": "sess-1"}));
        });
    }

    async fn connect(server: &MockServer) -> DatabricksConnector {
        mock_session(server);
        DatabricksConnector::connect(Client::new(), client_config(server), "dapi-test".to_string())
            .await
            .unwrap()
    }

    fn succeeded(columns: &[&str], rows: serde_json::Value) -> serde_json::Value {
        let columns: Vec<serde_json::Value> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| json!({"name": name, "type_name": "STRING", "type_text": "STRING", "position": i}))
            .collect();
        json!({
            "statement_id": "st-1",
            "status": {"state": "SUCCEEDED"},
            "manifest": {"format": "JSON_ARRAY", "schema": {"column_count": columns.len(), "columns": columns}},
            "result": {"chunk_index": 0, "row_offset": 0, "data_array": rows}
        })
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_identifier("main"), "`main`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
        assert_eq!(quote_literal("sales"), "'sales'");
        assert_eq!(quote_literal("o'brien"), "'o\\'brien'");
    }

    #[test]
    fn test_columns_query_filters_table_type() {
        let sql = columns_query("main", "sales", ObjectKind::Table);
        assert!(sql.contains("FROM `main`.information_schema.columns c"));
        assert!(sql.contains("JOIN `main`.information_schema.tables t"));
        assert!(sql.contains("WHERE c.table_schema = 'sales'"));
        assert!(sql.contains("AND t.table_type = 'BASE TABLE'"));

        let sql = columns_query("main", "sales", ObjectKind::View);
        assert!(sql.contains("AND t.table_type = 'VIEW'"));
    }

    #[test]
    fn test_schemas_query_excludes_information_schema() {
        assert_eq!(
            schemas_query("main"),
            "SELECT schema_name FROM `main`.information_schema.schemata WHERE schema_name != 'information_schema'"
        );
    }

    #[test]
    fn test_client_config_from_connector_config() {
        let config = crate::config::sample_config(crate::config::OutputMode::LocalOnly);
        let client_config = DatabricksClientConfig::from_connector_config(&config).unwrap();
        assert_eq!(client_config.base_url, "https://adb-123.azuredatabricks.net");
        assert_eq!(client_config.warehouse_id, "abc123");
    }

    #[tokio::test]
    async fn test_list_catalogs() {
        let server = MockServer::start();
        let connector = connect(&server).await;

        let statement_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/2.0/sql/statements")
                .json_body_partial(r#"{"session_id": "sess-1", "format": "JSON_ARRAY", "disposition": "INLINE"}"#);
            then.status(200)
                .json_body(succeeded(&["CATALOG_NAME"], json!([["main"], ["samples"], [null]])));
        });

        let catalogs = connector.list_catalogs().await.unwrap();

        statement_mock.assert();
        assert_eq!(catalogs, vec!["main".to_string(), "samples".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_columns_polls_and_follows_chunks() {
        let server = MockServer::start();
        let connector = connect(&server).await;

        server.mock(|when, then| {
            when.method(POST).path("/api/2.0/sql/statements");
            then.status(200).json_body(json!({
                "statement_id": "st-9",
                "status": {"state": "PENDING"}
            }));
        });
        let poll_mock = server.mock(|when, then| {
            when.method(GET).path("/api/2.0/sql/statements/st-9");
            then.status(200).json_body(json!({
                "statement_id": "st-9",
                "status": {"state": "SUCCEEDED"},
                "manifest": {"schema": {"columns": [
                    {"name": "table_name", "position": 0},
                    {"name": "column_name", "position": 1},
                    {"name": "data_type", "position": 2},
                    {"name": "is_nullable", "position": 3}
                ]}},
                "result": {
                    "data_array": [["orders", "id", "BIGINT", "NO"]],
                    "next_chunk_index": 1
                }
            }));
        });
        let chunk_mock = server.mock(|when, then| {
            when.method(GET).path("/api/2.0/sql/statements/st-9/result/chunks/1");
            then.status(200).json_body(json!({
                "chunk_index": 1,
                "data_array": [["orders", "note", "STRING", "YES"], ["orders", "x", null, null]]
            }));
        });

        let rows = connector
            .fetch_columns("main", "sales", ObjectKind::Table)
            .await
            .unwrap();

        poll_mock.assert();
        chunk_mock.assert();
        assert_eq!(
            rows,
            vec![
                ColumnRow::new("orders", "id", "BIGINT", "NO"),
                ColumnRow::new("orders", "note", "STRING", "YES"),
                ColumnRow::new("orders", "x", "", ""),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_statement_is_query_error() {
        let server = MockServer::start();
        let connector = connect(&server).await;

        server.mock(|when, then| {
            when.method(POST).path("/api/2.0/sql/statements");
            then.status(200).json_body(json!({
                "statement_id": "st-2",
                "status": {"state": "FAILED", "error": {"error_code": "PERMISSION_DENIED", "message": "no USE CATALOG"}}
            }));
        });

        let err = connector.list_schemas("main").await.unwrap_err();
        match err {
            EtlError::QueryError { message, .. } => {
                assert_eq!(message, "PERMISSION_DENIED: no USE CATALOG")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_is_query_error() {
        let server = MockServer::start();
        let connector = connect(&server).await;

        server.mock(|when, then| {
            when.method(POST).path("/api/2.0/sql/statements");
            then.status(503).body("warehouse stopped");
        });

        assert!(matches!(
            connector.list_catalogs().await,
            Err(EtlError::QueryError { .. })
        ));
    }

    #[tokio::test]
    async fn test_session_failure_is_init_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/2.0/sql/sessions");
            then.status(401).body("invalid token");
        });

        let result =
            DatabricksConnector::connect(Client::new(), client_config(&server), "bad".to_string()).await;
        assert!(matches!(result, Err(EtlError::ConnectorInitError { .. })));
    }

    #[tokio::test]
    async fn test_close_deletes_session_once() {
        let server = MockServer::start();
        let connector = connect(&server).await;

        let delete_mock = server.mock(|when, then| {
            when.method(DELETE).path("/api/2.0/sql/sessions/sess-1");
            then.status(200).json_body(json!({}));
        });

        connector.close().await.unwrap();
        connector.close().await.unwrap();

        delete_mock.assert_hits(1);
    }

    #[test]
    fn test_debug_redacts_token() {
        let connector = DatabricksConnector {
            client: Client::new(),
            config: DatabricksClientConfig::with_base_url("https://h", "wh"),
            token: "dapi-secret".to_string(),
            session_id: Mutex::new(None),
        };
        assert!(!format!("{:?}", connector).contains("dapi-secret"));
    }
}
