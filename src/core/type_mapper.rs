//! Databricks type name → catalog coarse type.

use crate::domain::entry::MetadataType;

/// Maps a Databricks native type to the catalog metadata type.
///
/// Case-insensitive and total: the whole name is compared, so anything outside
/// the table (including `DECIMAL(10,2)` or a trailing space) is [`MetadataType::Other`].
pub fn catalog_metadata_type(data_type: &str) -> MetadataType {
    match data_type.to_uppercase().as_str() {
        "BYTE" | "TINYINT" | "SHORT" | "SMALLINT" | "INT" | "INTEGER" | "LONG" | "BIGINT"
        | "FLOAT" | "REAL" | "DOUBLE" | "DECIMAL" | "DEC" | "NUMERIC" => MetadataType::Number,
        "STRING" | "VARCHAR" | "CHAR" => MetadataType::String,
        "TIMESTAMP" | "DATE" => MetadataType::Timestamp,
        "BOOLEAN" => MetadataType::Boolean,
        "BINARY" => MetadataType::Binary,
        _ => MetadataType::Other,
    }
}
