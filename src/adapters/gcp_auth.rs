//! OAuth access tokens for Google Cloud REST calls.

use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Environment variable holding a ready-made access token, e.g. from
/// `gcloud auth print-access-token`.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token, taken from the environment.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
}

/// Default service account token from the metadata server (GCE, GKE, Cloud Run, Dataproc).
#[derive(Debug, Clone)]
pub struct MetadataServerTokenProvider {
    client: Client,
    token_url: String,
}

impl MetadataServerTokenProvider {
    pub fn new(client: Client) -> Self {
        Self::with_token_url(client, METADATA_TOKEN_URL)
    }

    pub fn with_token_url(client: Client, token_url: impl Into<String>) -> Self {
        Self {
            client,
            token_url: token_url.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for MetadataServerTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::ConfigError {
                message: format!(
                    "metadata server token request failed (status={}): {}",
                    status, body
                ),
            });
        }

        let token: MetadataTokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

/// Uses [`ACCESS_TOKEN_ENV`] when set, otherwise the metadata server.
pub fn default_token_provider(client: Client) -> Arc<dyn TokenProvider> {
    match std::env::var(ACCESS_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => {
            tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
            Arc::new(StaticTokenProvider::new(token.trim()))
        }
        _ => {
            tracing::debug!("Using metadata server for access tokens");
            Arc::new(MetadataServerTokenProvider::new(client))
        }
    }
}
