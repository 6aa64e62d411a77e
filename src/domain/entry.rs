//! Dataplex metadata import item, one per output line.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aspect key of the column list attached to tables and views.
pub const SCHEMA_ASPECT_KEY: &str = "dataplex-types.global.schema";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportItem {
    pub entry: Entry,
    pub aspect_keys: Vec<String>,
    pub update_mask: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub entry_type: String,
    pub fully_qualified_name: String,
    pub parent_entry: String,
    pub entry_source: EntrySource,
    pub aspects: BTreeMap<String, Aspect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySource {
    pub display_name: String,
    pub system: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    pub aspect_type: String,
    pub data: AspectData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AspectData {
    Schema { fields: Vec<Field> },
    Empty {},
}

/// Column inside the schema aspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub mode: FieldMode,
    #[serde(rename = "dataType")]
    pub data_type: String,
    #[serde(rename = "metadataType")]
    pub metadata_type: MetadataType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    Nullable,
    Required,
}

impl FieldMode {
    pub fn from_nullable(nullable: bool) -> Self {
        if nullable {
            FieldMode::Nullable
        } else {
            FieldMode::Required
        }
    }
}

/// Coarse column type understood by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetadataType {
    Number,
    String,
    Timestamp,
    Boolean,
    Binary,
    Other,
}

impl ImportItem {
    /// Serializes to a single JSONL line (no trailing newline).
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Columns of the schema aspect, empty for catalogs and schemas.
    pub fn fields(&self) -> &[Field] {
        match self.entry.aspects.get(SCHEMA_ASPECT_KEY).map(|a| &a.data) {
            Some(AspectData::Schema { fields }) => fields,
            _ => &[],
        }
    }
}
