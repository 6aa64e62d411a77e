use std::fmt;

/// Source-type id used for the registry key, file names and `entry_source.system`.
pub const SOURCE_TYPE: &str = "databricks";

/// `information_schema.columns.is_nullable` value meaning the column is nullable.
pub const IS_NULLABLE_TRUE: &str = "YES";

/// Hierarchy of Databricks entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Catalog,
    Schema,
    Table,
    View,
}

impl EntryType {
    /// Suffix of the `databricks-*` entry type and aspect type ids.
    pub fn suffix(self) -> &'static str {
        match self {
            EntryType::Catalog => "catalog",
            EntryType::Schema => "schema",
            EntryType::Table => "table",
            EntryType::View => "view",
        }
    }
}

/// Entry types written before schema processing starts; they need no query.
pub const TOP_ENTRY_HIERARCHY: &[EntryType] = &[EntryType::Catalog];

/// Resolves the entry type resource name for `project` and `location`.
pub fn entry_type_name(entry_type: EntryType, project: &str, location: &str) -> String {
    format!(
        "projects/{}/locations/{}/entryTypes/{}-{}",
        project,
        location,
        SOURCE_TYPE,
        entry_type.suffix()
    )
}

/// Database objects whose columns are extracted inside each schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Table,
    View,
}

impl ObjectKind {
    /// Processing order inside a schema.
    pub const ALL: [ObjectKind; 2] = [ObjectKind::Table, ObjectKind::View];

    /// Value of `information_schema.tables.table_type` for this kind.
    pub fn native_table_type(self) -> &'static str {
        match self {
            ObjectKind::Table => "BASE TABLE",
            ObjectKind::View => "VIEW",
        }
    }

    pub fn entry_type(self) -> EntryType {
        match self {
            ObjectKind::Table => EntryType::Table,
            ObjectKind::View => EntryType::View,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Table => write!(f, "TABLE"),
            ObjectKind::View => write!(f, "VIEW"),
        }
    }
}

/// One row of the column metadata join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: String,
}

impl ColumnRow {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
        is_nullable: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            data_type: data_type.into(),
            is_nullable: is_nullable.into(),
        }
    }

    /// Exact comparison; `"yes"` or `"Y"` count as not nullable.
    pub fn nullable(&self) -> bool {
        self.is_nullable == IS_NULLABLE_TRUE
    }
}
