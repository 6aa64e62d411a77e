use crate::config::{min_entries_from_raw, ConnectorConfig, OutputMode};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{ArgGroup, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "databricks-connector")]
#[command(about = "Extracts Databricks metadata into a Dataplex metadata import file")]
#[command(group(
    ArgGroup::new("output")
        .required(true)
        .args(["local_output_only", "output_bucket"])
))]
pub struct CliConfig {
    #[arg(long, help = "Google Cloud project the metadata entries are imported into")]
    pub target_project_id: String,

    #[arg(long, help = "Google Cloud region the metadata is imported into")]
    pub target_location_id: String,

    #[arg(long, help = "Dataplex entry group to import metadata into")]
    pub target_entry_group_id: String,

    #[arg(long, help = "Databricks server hostname to connect to")]
    pub server_hostname: String,

    #[arg(long, help = "HTTP path of the Databricks SQL warehouse")]
    pub http_path: String,

    #[arg(long, help = "Secret Manager id of the personal access token")]
    pub access_token_secret: String,

    #[arg(long, help = "Write the metadata file to the local output directory only")]
    pub local_output_only: bool,

    #[arg(long, help = "Cloud Storage bucket for the metadata file, without gs://")]
    pub output_bucket: Option<String>,

    #[arg(
        long,
        requires = "output_bucket",
        help = "Folder within the bucket, folder name only"
    )]
    pub output_folder: Option<String>,

    #[arg(
        long,
        default_value_t = -1,
        allow_negative_numbers = true,
        help = "Minimum expected entries; fewer entries means the file is not uploaded"
    )]
    pub min_expected_entries: i64,

    #[arg(long, default_value = "./output")]
    pub output_dir: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,
}

impl CliConfig {
    pub fn output_mode(&self) -> OutputMode {
        match (&self.output_bucket, self.local_output_only) {
            (Some(bucket), false) => OutputMode::Bucket {
                bucket: bucket.clone(),
                folder: self.output_folder.clone(),
            },
            _ => OutputMode::LocalOnly,
        }
    }

    /// 轉成已驗證的 [`ConnectorConfig`]
    pub fn into_connector_config(self) -> Result<ConnectorConfig> {
        let output = self.output_mode();
        let config = ConnectorConfig {
            target_project_id: self.target_project_id,
            target_location_id: self.target_location_id,
            target_entry_group_id: self.target_entry_group_id,
            server_hostname: self.server_hostname,
            http_path: self.http_path,
            access_token_secret: self.access_token_secret,
            output,
            min_expected_entries: min_entries_from_raw(self.min_expected_entries),
            output_dir: self.output_dir,
        };
        config.validate()?;
        Ok(config)
    }
}
