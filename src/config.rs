//! Per-request configuration of the modifier pipeline.
//!
//! A [`Configuration`] names the request parameters each modifier reads, holds the
//! filter whitelist derived from the schema, and lists which modifiers run and in
//! what order.
//!
//! ```rust,ignore
//! let schema = StaticSchema::new().with_entity::<post::Entity>();
//!
//! let mut config = Configuration::default();
//! config.populate_filterable_fields(&schema, "posts");
//! config.set_filter_type(FilterType::Or);
//! config.add_modifier(Modifier::Has);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{errors::ModifierError, filtering::Modifier, schema::SchemaInspector};

/// Names of the request parameters read by the modifiers.
///
/// Deserialisable so applications can keep the aliases in their own config files;
/// missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterNames {
    pub sort: String,
    pub fields: String,
    pub limit: String,
    pub search: String,
    pub page: String,
    pub has: String,
}

impl Default for ParameterNames {
    fn default() -> Self {
        Self {
            sort: "sort".to_string(),
            fields: "fields".to_string(),
            limit: "limit".to_string(),
            search: "q".to_string(),
            page: "page".to_string(),
            has: "has".to_string(),
        }
    }
}

/// How multiple comparison filters are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    #[default]
    #[serde(alias = "andWhere")]
    And,
    #[serde(alias = "orWhere")]
    Or,
}

impl FromStr for FilterType {
    type Err = ModifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "and" | "andwhere" | "where" => Ok(Self::And),
            "or" | "orwhere" => Ok(Self::Or),
            _ => Err(ModifierError::invalid_parameter("filter_type", s)),
        }
    }
}

/// Scope of free-text search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Literal term, restricted to whitelisted columns
    #[default]
    ColumnLimited,
    /// `*` wildcards allowed, across every searchable column
    Wildcard,
}

impl FromStr for SearchMode {
    type Err = ModifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "column_limited" => Ok(Self::ColumnLimited),
            "wildcard" => Ok(Self::Wildcard),
            _ => Err(ModifierError::invalid_parameter("search_mode", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    names: ParameterNames,
    filterable_fields: IndexMap<String, String>,
    relation_fields: IndexMap<String, IndexMap<String, String>>,
    filter_type: FilterType,
    search_mode: SearchMode,
    default_limit: Option<u64>,
    max_limit: Option<u64>,
    modifiers: Vec<Modifier>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::from_names(ParameterNames::default())
    }
}

fn identity_map<I, S>(fields: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields
        .into_iter()
        .map(|field| {
            let field = field.into();
            (field.clone(), field)
        })
        .collect()
}

impl Configuration {
    #[must_use]
    pub fn from_names(names: ParameterNames) -> Self {
        Self {
            names,
            filterable_fields: IndexMap::new(),
            relation_fields: IndexMap::new(),
            filter_type: FilterType::default(),
            search_mode: SearchMode::default(),
            default_limit: None,
            max_limit: None,
            modifiers: Modifier::DEFAULTS.to_vec(),
        }
    }

    #[must_use]
    pub fn names(&self) -> &ParameterNames {
        &self.names
    }

    // ========================================================================
    // Parameter aliases
    // ========================================================================

    #[must_use]
    pub fn sort(&self) -> &str {
        &self.names.sort
    }

    pub fn set_sort(&mut self, name: impl Into<String>) {
        self.names.sort = name.into();
    }

    #[must_use]
    pub fn fields(&self) -> &str {
        &self.names.fields
    }

    pub fn set_fields(&mut self, name: impl Into<String>) {
        self.names.fields = name.into();
    }

    #[must_use]
    pub fn limit(&self) -> &str {
        &self.names.limit
    }

    pub fn set_limit(&mut self, name: impl Into<String>) {
        self.names.limit = name.into();
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.names.search
    }

    pub fn set_search(&mut self, name: impl Into<String>) {
        self.names.search = name.into();
    }

    #[must_use]
    pub fn page(&self) -> &str {
        &self.names.page
    }

    pub fn set_page(&mut self, name: impl Into<String>) {
        self.names.page = name.into();
    }

    #[must_use]
    pub fn has(&self) -> &str {
        &self.names.has
    }

    pub fn set_has(&mut self, name: impl Into<String>) {
        self.names.has = name.into();
    }

    // ========================================================================
    // Whitelists
    // ========================================================================

    /// Filterable columns, stored as an identity map
    #[must_use]
    pub fn filterable_fields(&self) -> &IndexMap<String, String> {
        &self.filterable_fields
    }

    #[must_use]
    pub fn is_filterable(&self, field: &str) -> bool {
        self.filterable_fields.contains_key(field)
    }

    pub fn set_filterable_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable_fields = identity_map(fields);
    }

    /// Add every column of `table` to the whitelist
    pub fn populate_filterable_fields(&mut self, inspector: &impl SchemaInspector, table: &str) {
        let columns = inspector.list_columns(table);
        tracing::debug!(table, columns = columns.len(), "Populating filterable fields");
        self.filterable_fields.extend(identity_map(columns));
    }

    /// Whitelist for sub-query keys of a `has` filter on `relation`
    #[must_use]
    pub fn relation_fields(&self, relation: &str) -> Option<&IndexMap<String, String>> {
        self.relation_fields.get(relation)
    }

    pub fn set_relation_fields<I, S>(&mut self, relation: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relation_fields
            .insert(relation.into(), identity_map(fields));
    }

    pub fn populate_relation_fields(
        &mut self,
        inspector: &impl SchemaInspector,
        relation: &str,
        table: &str,
    ) {
        let columns = inspector.list_columns(table);
        tracing::debug!(relation, table, columns = columns.len(), "Populating relation fields");
        self.relation_fields
            .entry(relation.to_string())
            .or_default()
            .extend(identity_map(columns));
    }

    // ========================================================================
    // Modes and limits
    // ========================================================================

    #[must_use]
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    #[must_use]
    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    pub fn set_search_mode(&mut self, search_mode: SearchMode) {
        self.search_mode = search_mode;
    }

    /// Limit used when the request has none
    #[must_use]
    pub fn default_limit(&self) -> Option<u64> {
        self.default_limit
    }

    pub fn set_default_limit(&mut self, limit: Option<u64>) {
        self.default_limit = limit;
    }

    /// Upper bound applied to every limit
    #[must_use]
    pub fn max_limit(&self) -> Option<u64> {
        self.max_limit
    }

    pub fn set_max_limit(&mut self, limit: Option<u64>) {
        self.max_limit = limit;
    }

    // ========================================================================
    // Modifiers
    // ========================================================================

    #[must_use]
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn add_modifier(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }

    /// Remove the first occurrence of `modifier`. Returns `false`, leaving the list
    /// untouched, when it is not registered.
    pub fn remove_modifier(&mut self, modifier: Modifier) -> bool {
        match self.modifiers.iter().position(|m| *m == modifier) {
            Some(index) => {
                self.modifiers.remove(index);
                true
            }
            None => false,
        }
    }
}
