//! Resource names, fully qualified names and aspect keys of import entries.

use crate::config::ConnectorConfig;
use crate::domain::model::{EntryType, SOURCE_TYPE};

/// Position of an entry in the catalog → schema → object hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPath<'a> {
    Catalog {
        catalog: &'a str,
    },
    Schema {
        catalog: &'a str,
        schema: &'a str,
    },
    Object {
        catalog: &'a str,
        schema: &'a str,
        name: &'a str,
        entry_type: EntryType,
    },
}

impl<'a> EntryPath<'a> {
    pub fn entry_type(&self) -> EntryType {
        match *self {
            EntryPath::Catalog { .. } => EntryType::Catalog,
            EntryPath::Schema { .. } => EntryType::Schema,
            EntryPath::Object { entry_type, .. } => entry_type,
        }
    }

    /// Last path component, used as the display name.
    pub fn leaf(&self) -> &'a str {
        match *self {
            EntryPath::Catalog { catalog } => catalog,
            EntryPath::Schema { schema, .. } => schema,
            EntryPath::Object { name, .. } => name,
        }
    }

    pub fn parent(&self) -> Option<EntryPath<'a>> {
        match *self {
            EntryPath::Catalog { .. } => None,
            EntryPath::Schema { catalog, .. } => Some(EntryPath::Catalog { catalog }),
            EntryPath::Object {
                catalog, schema, ..
            } => Some(EntryPath::Schema { catalog, schema }),
        }
    }
}

fn entry_name_prefix(config: &ConnectorConfig) -> String {
    format!(
        "projects/{}/locations/{}/entryGroups/{}/entries/",
        config.target_project_id, config.target_location_id, config.target_entry_group_id
    )
}

/// `projects/{p}/locations/{l}/entryGroups/{g}/entries/{host}/catalogs/{c}[/schemas/{s}[/tables|views/{t}]]`
pub fn entry_name(config: &ConnectorConfig, path: &EntryPath<'_>) -> String {
    let mut name = entry_name_prefix(config);
    name.push_str(&config.server_hostname);

    match path {
        EntryPath::Catalog { catalog } => {
            name.push_str(&format!("/catalogs/{}", catalog));
        }
        EntryPath::Schema { catalog, schema } => {
            name.push_str(&format!("/catalogs/{}/schemas/{}", catalog, schema));
        }
        EntryPath::Object {
            catalog,
            schema,
            name: object,
            entry_type,
        } => {
            let collection = match entry_type {
                EntryType::View => "views",
                _ => "tables",
            };
            name.push_str(&format!(
                "/catalogs/{}/schemas/{}/{}/{}",
                catalog, schema, collection, object
            ));
        }
    }

    name
}

/// Parent entry name; the catalog is top level and has an empty parent.
pub fn parent_entry_name(config: &ConnectorConfig, path: &EntryPath<'_>) -> String {
    path.parent()
        .map(|parent| entry_name(config, &parent))
        .unwrap_or_default()
}

/// `databricks:`host`.catalog.schema.table`
pub fn fully_qualified_name(config: &ConnectorConfig, path: &EntryPath<'_>) -> String {
    let host = format!("`{}`", config.server_hostname);
    let parts: Vec<&str> = match *path {
        EntryPath::Catalog { catalog } => vec![host.as_str(), catalog],
        EntryPath::Schema { catalog, schema } => vec![host.as_str(), catalog, schema],
        EntryPath::Object {
            catalog,
            schema,
            name,
            ..
        } => vec![host.as_str(), catalog, schema, name],
    };
    format!("{}:{}", SOURCE_TYPE, parts.join("."))
}

/// `{project}.{location}.databricks-{suffix}`
pub fn entry_aspect_key(config: &ConnectorConfig, entry_type: EntryType) -> String {
    format!(
        "{}.{}.{}-{}",
        config.target_project_id,
        config.target_location_id,
        SOURCE_TYPE,
        entry_type.suffix()
    )
}
