//! Raw `information_schema` rows → import items.

use crate::config::ConnectorConfig;
use crate::core::naming::{self, EntryPath};
use crate::core::type_mapper::catalog_metadata_type;
use crate::domain::entry::{
    Aspect, AspectData, Entry, EntrySource, Field, FieldMode, ImportItem, SCHEMA_ASPECT_KEY,
};
use crate::domain::model::{ColumnRow, EntryType, ObjectKind, SOURCE_TYPE};
use std::collections::{BTreeMap, HashMap};

/// Builds one import item for `path`, with the entry aspect and any extra aspects.
pub(crate) fn build_entry(
    config: &ConnectorConfig,
    path: &EntryPath<'_>,
    extra_aspects: Vec<(String, AspectData)>,
) -> ImportItem {
    let entry_type = path.entry_type();
    let entry_aspect_key = naming::entry_aspect_key(config, entry_type);

    let mut aspects = BTreeMap::new();
    aspects.insert(
        entry_aspect_key.clone(),
        Aspect {
            aspect_type: entry_aspect_key.clone(),
            data: AspectData::Empty {},
        },
    );
    let mut aspect_keys = vec![entry_aspect_key];
    for (key, data) in extra_aspects {
        aspect_keys.push(key.clone());
        aspects.insert(
            key.clone(),
            Aspect {
                aspect_type: key,
                data,
            },
        );
    }

    ImportItem {
        entry: Entry {
            name: naming::entry_name(config, path),
            entry_type: crate::domain::model::entry_type_name(
                entry_type,
                &config.target_project_id,
                &config.target_location_id,
            ),
            fully_qualified_name: naming::fully_qualified_name(config, path),
            parent_entry: naming::parent_entry_name(config, path),
            entry_source: EntrySource {
                display_name: path.leaf().to_string(),
                system: SOURCE_TYPE.to_string(),
            },
            aspects,
        },
        aspect_keys,
        update_mask: vec!["aspects".to_string()],
    }
}

/// One schema entry per schema name, linked to the catalog entry.
pub fn build_schemas(
    config: &ConnectorConfig,
    catalog: &str,
    schemas: &[String],
) -> Vec<ImportItem> {
    schemas
        .iter()
        .map(|schema| {
            build_entry(
                config,
                &EntryPath::Schema {
                    catalog,
                    schema: schema.as_str(),
                },
                Vec::new(),
            )
        })
        .collect()
}

fn to_field(row: &ColumnRow) -> Field {
    Field {
        name: row.column_name.clone(),
        mode: FieldMode::from_nullable(row.nullable()),
        data_type: row.data_type.clone(),
        metadata_type: catalog_metadata_type(&row.data_type),
    }
}

/// Groups column rows by table and builds one table or view entry per table.
///
/// Tables keep the order in which they first appear in `rows`, columns keep
/// their row order.
pub fn build_dataset(
    config: &ConnectorConfig,
    catalog: &str,
    schema: &str,
    kind: ObjectKind,
    rows: &[ColumnRow],
) -> Vec<ImportItem> {
    let mut order: Vec<&str> = Vec::new();
    let mut fields_by_table: HashMap<&str, Vec<Field>> = HashMap::new();

    for row in rows {
        let fields = fields_by_table
            .entry(row.table_name.as_str())
            .or_insert_with(|| {
                order.push(row.table_name.as_str());
                Vec::new()
            });
        fields.push(to_field(row));
    }

    let entry_type: EntryType = kind.entry_type();
    order
        .into_iter()
        .map(|table| {
            let fields = fields_by_table.remove(table).unwrap_or_default();
            build_entry(
                config,
                &EntryPath::Object {
                    catalog,
                    schema,
                    name: table,
                    entry_type,
                },
                vec![(SCHEMA_ASPECT_KEY.to_string(), AspectData::Schema { fields })],
            )
        })
        .collect()
}
