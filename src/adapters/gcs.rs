use crate::adapters::gcp_auth::TokenProvider;
use crate::domain::ports::Uploader;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use url::Url;

pub const GCS_BASE_URL: &str = "https://storage.googleapis.com";

/// Cloud Storage JSON API, single-request media upload.
pub struct GcsUploader {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl GcsUploader {
    pub fn new(client: Client, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_base_url(client, GCS_BASE_URL, tokens)
    }

    pub fn with_base_url(
        client: Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            tokens,
        }
    }

    /// `folder/file_name`, or `file_name` at the bucket root.
    pub fn object_name(file_name: &str, folder: Option<&str>) -> String {
        match folder {
            Some(folder) if !folder.is_empty() => {
                format!("{}/{}", folder.trim_matches('/'), file_name)
            }
            _ => file_name.to_string(),
        }
    }

    fn upload_url(&self, bucket: &str, object: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/upload/storage/v1/b/{}/o",
            self.base_url.trim_end_matches('/'),
            bucket
        ))?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", object);
        Ok(url)
    }
}

#[async_trait]
impl Uploader for GcsUploader {
    async fn upload(&self, local_file: &Path, bucket: &str, folder: Option<&str>) -> Result<String> {
        let file_name = local_file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| EtlError::UploadError {
                destination: bucket.to_string(),
                message: format!("invalid file name {}", local_file.display()),
            })?;
        let object = Self::object_name(file_name, folder);
        let destination = format!("gs://{}/{}", bucket, object);

        let data = tokio::fs::read(local_file).await?;
        let url = self.upload_url(bucket, &object)?;
        let token = self.tokens.access_token().await?;

        tracing::debug!("Uploading {} bytes to {}", data.len(), destination);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header("Content-Type", "application/x-ndjson")
            .body(data)
            .send()
            .await
            .map_err(|e| EtlError::UploadError {
                destination: destination.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::UploadError {
                destination,
                message: format!("HTTP {}: {}", status, body),
            });
        }

        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gcp_auth::StaticTokenProvider;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn uploader(base_url: String) -> GcsUploader {
        GcsUploader::with_base_url(
            Client::new(),
            base_url,
            Arc::new(StaticTokenProvider::new("ya29.test")),
        )
    }

    #[test]
    fn test_object_name() {
        assert_eq!(GcsUploader::object_name("f.jsonl", Some("databricks")), "databricks/f.jsonl");
        assert_eq!(GcsUploader::object_name("f.jsonl", Some("a/b/")), "a/b/f.jsonl");
        assert_eq!(GcsUploader::object_name("f.jsonl", None), "f.jsonl");
    }

    #[tokio::test]
    async fn test_upload_posts_file_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("databricks-host.jsonl");
        std::fs::write(&path, "{\"a\":1}\n").unwrap();

        let server = MockServer::start();
        let upload_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/upload/storage/v1/b/metadata-imports/o")
                .query_param("uploadType", "media")
                .query_param("name", "databricks/databricks-host.jsonl")
                .header("Authorization", "Bearer ya29.test")
                .body("{\"a\":1}\n");
            then.status(200).json_body(serde_json::json!({"name": "databricks/databricks-host.jsonl"}));
        });

        let location = uploader(server.base_url())
            .upload(&path, "metadata-imports", Some("databricks"))
            .await
            .unwrap();

        upload_mock.assert();
        assert_eq!(location, "gs://metadata-imports/databricks/databricks-host.jsonl");
    }

    #[tokio::test]
    async fn test_upload_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.jsonl");
        std::fs::write(&path, "{}\n").unwrap();

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(403).body("forbidden");
        });

        let err = uploader(server.base_url())
            .upload(&path, "metadata-imports", None)
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::UploadError { .. }));
    }
}
