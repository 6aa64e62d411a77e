use crate::adapters::databricks::{DatabricksClientConfig, DatabricksConnector};
use crate::config::ConnectorConfig;
use crate::domain::model::SOURCE_TYPE;
use crate::domain::ports::{SecretStore, SourceConnector};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;

/// Builds a connected source for one source type.
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    async fn create(
        &self,
        config: &ConnectorConfig,
        secrets: &dyn SecretStore,
    ) -> Result<Box<dyn SourceConnector>>;
}

pub struct DatabricksFactory {
    client: Client,
}

impl DatabricksFactory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConnectorFactory for DatabricksFactory {
    async fn create(
        &self,
        config: &ConnectorConfig,
        secrets: &dyn SecretStore,
    ) -> Result<Box<dyn SourceConnector>> {
        let token = secrets
            .get_secret(&config.access_token_secret)
            .await
            .map_err(|e| EtlError::ConnectorInitError {
                source_type: SOURCE_TYPE.to_string(),
                message: format!("cannot read access token: {}", e),
            })?;

        let client_config = DatabricksClientConfig::from_connector_config(config)?;
        tracing::info!(
            "🔌 Connecting to Databricks at {} (warehouse {})",
            config.server_hostname,
            client_config.warehouse_id
        );

        let connector = DatabricksConnector::connect(self.client.clone(), client_config, token).await?;
        Ok(Box::new(connector))
    }
}

/// Source type name to factory.
pub struct ConnectorRegistry {
    factories: HashMap<&'static str, Box<dyn ConnectorFactory>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_defaults(client: Client) -> Self {
        let mut registry = Self::new();
        registry.register(SOURCE_TYPE, Box::new(DatabricksFactory::new(client)));
        registry
    }

    pub fn register(&mut self, source_type: &'static str, factory: Box<dyn ConnectorFactory>) {
        self.factories.insert(source_type, factory);
    }

    pub fn source_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.factories.keys().copied().collect();
        types.sort_unstable();
        types
    }

    pub async fn create(
        &self,
        source_type: &str,
        config: &ConnectorConfig,
        secrets: &dyn SecretStore,
    ) -> Result<Box<dyn SourceConnector>> {
        let factory = self
            .factories
            .get(source_type)
            .ok_or_else(|| EtlError::ConnectorInitError {
                source_type: source_type.to_string(),
                message: format!(
                    "unsupported source type, expected one of: {}",
                    self.source_types().join(", ")
                ),
            })?;

        factory.create(config, secrets).await
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
