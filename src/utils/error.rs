use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Error setting up connector for {source_type}: {message}")]
    ConnectorInitError {
        source_type: String,
        message: String,
    },

    #[error("Error during metadata extraction from db: {message}")]
    QueryError { query: String, message: String },

    #[error("Failed to access secret {secret}: {message}")]
    SecretError { secret: String, message: String },

    #[error("Upload to {destination} failed: {message}")]
    UploadError {
        destination: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Connector,
    Query,
    Secret,
    Upload,
    Network,
    Io,
    Serialization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::UrlError(_) => ErrorCategory::Configuration,
            EtlError::ConnectorInitError { .. } => ErrorCategory::Connector,
            EtlError::QueryError { .. } => ErrorCategory::Query,
            EtlError::SecretError { .. } => ErrorCategory::Secret,
            EtlError::UploadError { .. } => ErrorCategory::Upload,
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::SerializationError(_) => ErrorCategory::Serialization,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Query | ErrorCategory::Upload | ErrorCategory::Network => {
                ErrorSeverity::High
            }
            ErrorCategory::Connector | ErrorCategory::Secret => ErrorSeverity::Critical,
            ErrorCategory::Io | ErrorCategory::Serialization => ErrorSeverity::Critical,
        }
    }

    /// 所有錯誤都會中止整個執行；沒有重試，所以統一回傳 1
    pub fn exit_code(&self) -> i32 {
        1
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command line arguments or the TOML configuration file"
            }
            ErrorCategory::Connector => {
                "Verify --server-hostname and --http-path point at a running SQL warehouse"
            }
            ErrorCategory::Query => {
                "Make sure the token can read information_schema in every catalog"
            }
            ErrorCategory::Secret => {
                "Check that the secret exists and the service account has secretAccessor"
            }
            ErrorCategory::Upload => {
                "Check the bucket name and that the service account can create objects in it"
            }
            ErrorCategory::Network => "Check network connectivity to the remote service",
            ErrorCategory::Io => "Check that the output directory is writable",
            ErrorCategory::Serialization => "This is likely a bug, please report it",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            EtlError::QueryError { message, .. } => {
                format!("Error during metadata extraction from db: {}", message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
