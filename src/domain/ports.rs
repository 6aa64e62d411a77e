use crate::domain::model::{ColumnRow, ObjectKind};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Read side of the connector: catalog, schema and column metadata.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn list_catalogs(&self) -> Result<Vec<String>>;

    /// Schemas of `catalog`, without the system's own `information_schema`.
    async fn list_schemas(&self, catalog: &str) -> Result<Vec<String>>;

    async fn fetch_columns(
        &self,
        catalog: &str,
        schema: &str,
        kind: ObjectKind,
    ) -> Result<Vec<ColumnRow>>;

    /// Releases the session. Called once after the walk.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Resolves a secret identifier to its plaintext value.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, secret_id: &str) -> Result<String>;
}

/// Copies a finished local file to remote storage.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Returns the remote location the file was written to.
    async fn upload(&self, local_file: &Path, bucket: &str, folder: Option<&str>)
        -> Result<String>;
}

#[async_trait]
impl<T: SourceConnector + ?Sized> SourceConnector for Box<T> {
    async fn list_catalogs(&self) -> Result<Vec<String>> {
        (**self).list_catalogs().await
    }

    async fn list_schemas(&self, catalog: &str) -> Result<Vec<String>> {
        (**self).list_schemas(catalog).await
    }

    async fn fetch_columns(
        &self,
        catalog: &str,
        schema: &str,
        kind: ObjectKind,
    ) -> Result<Vec<ColumnRow>> {
        (**self).fetch_columns(catalog, schema, kind).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}
