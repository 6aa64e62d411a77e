//! Entries for hierarchy levels that need no query.

use crate::config::ConnectorConfig;
use crate::core::entry_builder::build_entry;
use crate::core::naming::EntryPath;
use crate::domain::entry::ImportItem;
use crate::domain::model::EntryType;

/// Builds the top-level entry of `entry_type` for `catalog`.
///
/// Only [`EntryType::Catalog`] sits above the schemas; other types return `None`.
pub fn create(config: &ConnectorConfig, entry_type: EntryType, catalog: &str) -> Option<ImportItem> {
    match entry_type {
        EntryType::Catalog => Some(build_entry(
            config,
            &EntryPath::Catalog { catalog },
            Vec::new(),
        )),
        EntryType::Schema | EntryType::Table | EntryType::View => None,
    }
}
