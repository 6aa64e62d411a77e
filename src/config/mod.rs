#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::SOURCE_TYPE;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Where the finished metadata file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    LocalOnly,
    Bucket {
        bucket: String,
        folder: Option<String>,
    },
}

impl OutputMode {
    pub fn is_local_only(&self) -> bool {
        matches!(self, OutputMode::LocalOnly)
    }
}

/// Validated settings for one run. Built by the CLI or TOML front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    pub target_project_id: String,
    pub target_location_id: String,
    pub target_entry_group_id: String,
    pub server_hostname: String,
    pub http_path: String,
    /// Secret Manager id of the personal access token, never the token itself.
    pub access_token_secret: String,
    pub output: OutputMode,
    /// `None` disables the minimum entry safety check.
    pub min_expected_entries: Option<usize>,
    pub output_dir: PathBuf,
}

impl ConnectorConfig {
    /// `databricks-<hostname>.jsonl`
    pub fn output_file_name(&self) -> String {
        format!("{}-{}.jsonl", SOURCE_TYPE, self.server_hostname)
    }

    pub fn output_file_path(&self) -> PathBuf {
        self.output_dir.join(self.output_file_name())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn warehouse_id(&self) -> Option<&str> {
        validation::warehouse_id_from_http_path(&self.http_path)
    }
}

/// Negative thresholds (the CLI default is `-1`) mean "disabled".
pub fn min_entries_from_raw(raw: i64) -> Option<usize> {
    usize::try_from(raw).ok()
}

impl Validate for ConnectorConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_resource_id("target_project_id", &self.target_project_id)?;
        validation::validate_resource_id("target_location_id", &self.target_location_id)?;
        validation::validate_resource_id("target_entry_group_id", &self.target_entry_group_id)?;

        validation::validate_hostname("server_hostname", &self.server_hostname)?;
        validation::validate_http_path("http_path", &self.http_path)?;
        validation::validate_non_empty_string("access_token_secret", &self.access_token_secret)?;

        if let OutputMode::Bucket { bucket, folder } = &self.output {
            validation::validate_gcs_bucket_name("output_bucket", bucket)?;
            if let Some(folder) = folder {
                validation::validate_folder("output_folder", folder)?;
            }
        }

        validation::validate_path("output_dir", &self.output_dir.to_string_lossy())?;

        tracing::debug!("✅ Connector configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_config(output: OutputMode) -> ConnectorConfig {
    ConnectorConfig {
        target_project_id: "my-project".to_string(),
        target_location_id: "us-central1".to_string(),
        target_entry_group_id: "databricks-eg".to_string(),
        server_hostname: "adb-123.azuredatabricks.net".to_string(),
        http_path: "/sql/1.0/warehouses/abc123".to_string(),
        access_token_secret: "databricks-token".to_string(),
        output,
        min_expected_entries: None,
        output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
    }
}
