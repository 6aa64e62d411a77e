use crate::adapters::gcp_auth::TokenProvider;
use crate::domain::ports::SecretStore;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

pub const SECRET_MANAGER_BASE_URL: &str = "https://secretmanager.googleapis.com/v1";

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

/// Secret Manager over REST (`versions/*:access`).
pub struct SecretManagerStore {
    client: Client,
    base_url: String,
    project_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl SecretManagerStore {
    pub fn new(client: Client, project_id: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_base_url(client, SECRET_MANAGER_BASE_URL, project_id, tokens)
    }

    pub fn with_base_url(
        client: Client,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            tokens,
        }
    }

    /// Full version name for a bare secret id or a `projects/…/secrets/…` name.
    pub fn version_name(&self, secret_id: &str) -> String {
        let name = if secret_id.starts_with("projects/") {
            secret_id.to_string()
        } else {
            format!("projects/{}/secrets/{}", self.project_id, secret_id)
        };

        if name.contains("/versions/") {
            name
        } else {
            format!("{}/versions/latest", name)
        }
    }

    fn secret_error(secret: &str, message: impl Into<String>) -> EtlError {
        EtlError::SecretError {
            secret: secret.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl SecretStore for SecretManagerStore {
    async fn get_secret(&self, secret_id: &str) -> Result<String> {
        let name = self.version_name(secret_id);
        let url = format!("{}/{}:access", self.base_url.trim_end_matches('/'), name);
        let token = self.tokens.access_token().await?;

        tracing::debug!("Accessing secret version {}", name);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Self::secret_error(&name, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::secret_error(&name, format!("HTTP {}", status)));
        }

        let body: AccessSecretVersionResponse = response
            .json()
            .await
            .map_err(|e| Self::secret_error(&name, format!("invalid response: {}", e)))?;

        let bytes = STANDARD
            .decode(body.payload.data.as_bytes())
            .map_err(|e| Self::secret_error(&name, format!("invalid payload encoding: {}", e)))?;
        let value = String::from_utf8(bytes)
            .map_err(|_| Self::secret_error(&name, "payload is not valid UTF-8"))?;

        Ok(value.trim_end_matches(['\r', '\n']).to_string())
    }
}
