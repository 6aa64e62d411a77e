// Adapters layer: concrete implementations of the domain ports (source, secrets, upload).

pub mod databricks;
pub mod gcp_auth;
pub mod gcs;
pub mod registry;
pub mod secret_manager;

pub use databricks::DatabricksConnector;
pub use gcp_auth::{default_token_provider, TokenProvider};
pub use gcs::GcsUploader;
pub use registry::{ConnectorFactory, ConnectorRegistry};
pub use secret_manager::SecretManagerStore;
