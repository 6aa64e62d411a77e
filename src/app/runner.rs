use crate::adapters::gcp_auth::default_token_provider;
use crate::adapters::{ConnectorRegistry, GcsUploader, SecretManagerStore};
use crate::config::ConnectorConfig;
use crate::core::pipeline::{MetadataPipeline, RunReport};
use crate::utils::error::Result;
use reqwest::Client;

/// Resolves the source connector for `source_type` and runs one extraction.
///
/// The secret is read from Secret Manager in the target project. Access tokens
/// for Secret Manager and Cloud Storage come from [`default_token_provider`].
pub async fn run_connector(
    config: ConnectorConfig,
    source_type: &str,
    monitor_enabled: bool,
) -> Result<RunReport> {
    let client = Client::builder().build()?;
    let tokens = default_token_provider(client.clone());

    let secrets = SecretManagerStore::new(
        client.clone(),
        config.target_project_id.clone(),
        tokens.clone(),
    );
    let registry = ConnectorRegistry::with_defaults(client.clone());
    let connector = registry.create(source_type, &config, &secrets).await?;

    let uploader = GcsUploader::new(client, tokens);
    let pipeline = MetadataPipeline::new_with_monitoring(config, connector, uploader, monitor_enabled);

    pipeline.run().await
}
