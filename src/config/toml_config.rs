use crate::config::{ConnectorConfig, OutputMode, DEFAULT_OUTPUT_DIR};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// File form of the connector settings.
///
/// ```toml
/// [target]
/// project_id = "my-project"
/// location_id = "us-central1"
/// entry_group_id = "databricks-eg"
///
/// [source]
/// server_hostname = "adb-123.azuredatabricks.net"
/// http_path = "/sql/1.0/warehouses/abc123"
/// access_token_secret = "${DATABRICKS_TOKEN_SECRET}"
///
/// [output]
/// bucket = "metadata-imports"
/// folder = "databricks"
/// min_expected_entries = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub target: TargetConfig,
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub project_id: String,
    pub location_id: String,
    pub entry_group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_type")]
    pub r#type: String,
    pub server_hostname: String,
    pub http_path: String,
    pub access_token_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    pub local_only: Option<bool>,
    pub bucket: Option<String>,
    pub folder: Option<String>,
    pub min_expected_entries: Option<i64>,
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn default_source_type() -> String {
    crate::domain::model::SOURCE_TYPE.to_string()
}

fn env_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var regex is valid"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATABRICKS_TOKEN_SECRET})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_regex()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn source_type(&self) -> &str {
        &self.source.r#type
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    fn output_mode(&self) -> Result<OutputMode> {
        let local_only = self.output.local_only.unwrap_or(false);
        match (local_only, &self.output.bucket) {
            (true, Some(_)) => Err(EtlError::ConfigValidationError {
                field: "output".to_string(),
                message: "local_only and bucket are mutually exclusive".to_string(),
            }),
            (true, None) => {
                if self.output.folder.is_some() {
                    return Err(EtlError::ConfigValidationError {
                        field: "output.folder".to_string(),
                        message: "folder requires bucket".to_string(),
                    });
                }
                Ok(OutputMode::LocalOnly)
            }
            (false, Some(bucket)) => Ok(OutputMode::Bucket {
                bucket: bucket.clone(),
                folder: self.output.folder.clone(),
            }),
            (false, None) => Err(EtlError::MissingConfigError {
                field: "output.bucket or output.local_only".to_string(),
            }),
        }
    }

    /// 轉成已驗證的 [`ConnectorConfig`]
    pub fn to_connector_config(&self) -> Result<ConnectorConfig> {
        let config = ConnectorConfig {
            target_project_id: self.target.project_id.clone(),
            target_location_id: self.target.location_id.clone(),
            target_entry_group_id: self.target.entry_group_id.clone(),
            server_hostname: self.source.server_hostname.clone(),
            http_path: self.source.http_path.clone(),
            access_token_secret: self.source.access_token_secret.clone(),
            output: self.output_mode()?,
            min_expected_entries: self
                .output
                .min_expected_entries
                .and_then(super::min_entries_from_raw),
            output_dir: PathBuf::from(
                self.output
                    .directory
                    .as_deref()
                    .unwrap_or(DEFAULT_OUTPUT_DIR),
            ),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(unresolved) = env_var_regex().find(&self.source.access_token_secret) {
            return Err(EtlError::ConfigValidationError {
                field: "source.access_token_secret".to_string(),
                message: format!("environment variable {} is not set", unresolved.as_str()),
            });
        }
        self.to_connector_config().map(|_| ())
    }
}
