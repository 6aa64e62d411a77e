use crate::utils::error::{EtlError, Result};
use regex::Regex;
use std::sync::OnceLock;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn hostname_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*(:\d{1,5})?$")
            .expect("hostname regex is valid")
    })
}

fn resource_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("resource id regex is valid"))
}

fn bucket_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9._-]{1,220}[a-z0-9]$").expect("bucket regex is valid")
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Databricks workspace hostname, without scheme (e.g. `adb-123.azuredatabricks.net`).
pub fn validate_hostname(field_name: &str, hostname: &str) -> Result<()> {
    validate_non_empty_string(field_name, hostname)?;

    if hostname.contains("://") {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: hostname.to_string(),
            reason: "Hostname must not include a scheme such as https://".to_string(),
        });
    }

    if !hostname_regex().is_match(hostname) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: hostname.to_string(),
            reason: "Not a valid hostname".to_string(),
        });
    }

    Ok(())
}

/// SQL warehouse HTTP path, e.g. `/sql/1.0/warehouses/abc123`.
pub fn validate_http_path(field_name: &str, http_path: &str) -> Result<()> {
    validate_non_empty_string(field_name, http_path)?;

    if warehouse_id_from_http_path(http_path).is_none() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: http_path.to_string(),
            reason: "Expected the form /sql/1.0/warehouses/<warehouse-id>".to_string(),
        });
    }

    Ok(())
}

pub fn warehouse_id_from_http_path(http_path: &str) -> Option<&str> {
    http_path
        .strip_prefix("/sql/1.0/warehouses/")
        .or_else(|| http_path.strip_prefix("sql/1.0/warehouses/"))
        .map(|id| id.trim_end_matches('/'))
        .filter(|id| !id.is_empty() && !id.contains('/'))
}

/// Project, location and entry group ids: lowercase letters, digits and hyphens.
pub fn validate_resource_id(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    if !resource_id_regex().is_match(value) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Must start with a lowercase letter and contain only lowercase letters, digits and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

pub fn validate_gcs_bucket_name(field_name: &str, bucket: &str) -> Result<()> {
    validate_non_empty_string(field_name, bucket)?;

    if bucket.starts_with("gs://") {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket.to_string(),
            reason: "Do not include the gs:// prefix".to_string(),
        });
    }

    if bucket.len() < 3 || bucket.len() > 222 || !bucket_regex().is_match(bucket) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket.to_string(),
            reason: "Bucket names use 3-222 lowercase letters, digits, dots, hyphens and underscores"
                .to_string(),
        });
    }

    Ok(())
}

pub fn validate_folder(field_name: &str, folder: &str) -> Result<()> {
    validate_non_empty_string(field_name, folder)?;

    if folder.starts_with('/') || folder.ends_with('/') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: folder.to_string(),
            reason: "Specify the folder name only, without leading or trailing '/'".to_string(),
        });
    }

    Ok(())
}
