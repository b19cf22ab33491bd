//! Schema introspection.
//!
//! The filter whitelist must come from the schema, never from the request. A
//! [`SchemaInspector`] answers "which columns does this table have?"; the crate
//! ships [`StaticSchema`], which can be filled by hand or straight from sea-orm
//! entity definitions.

use indexmap::IndexMap;
use sea_orm::{EntityName, EntityTrait, IdenStatic, Iterable};

/// Lists the columns of a table.
pub trait SchemaInspector {
    /// Column names of `table`, in schema order. Unknown tables have no columns.
    fn list_columns(&self, table: &str) -> Vec<String>;
}

/// Column names of a sea-orm entity, in declaration order
#[must_use]
pub fn entity_columns<E: EntityTrait>() -> Vec<String> {
    E::Column::iter()
        .map(|column| column.as_str().to_string())
        .collect()
}

/// Table name of a sea-orm entity
#[must_use]
pub fn entity_table<E: EntityTrait>() -> String {
    E::default().table_name().to_string()
}

/// In-memory table → columns map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSchema {
    tables: IndexMap<String, Vec<String>>,
}

impl StaticSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .insert(table.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    /// Register the table and columns of a sea-orm entity
    #[must_use]
    pub fn with_entity<E: EntityTrait>(self) -> Self {
        self.with_table(entity_table::<E>(), entity_columns::<E>())
    }

    #[must_use]
    pub fn tables(&self) -> impl Iterator<Item = &String> {
        self.tables.keys()
    }
}

impl SchemaInspector for StaticSchema {
    fn list_columns(&self, table: &str) -> Vec<String> {
        self.tables.get(table).cloned().unwrap_or_default()
    }
}
