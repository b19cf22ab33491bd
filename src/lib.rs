//! Turns untrusted request parameters into safe query builder calls.
//!
//! A request's query string is parsed once into a [`ParamMap`]; the configured
//! modifiers then read their own parameters from it and drive a [`QueryBuilder`].
//! Field names are checked against whitelists and operators against a closed set, so
//! nothing from the request reaches the query unvalidated.
//!
//! ```rust,ignore
//! use query_modifier::{apply, Configuration, ParamMap, SeaQueryBuilder, StaticSchema};
//!
//! let schema = StaticSchema::new().with_entity::<post::Entity>();
//! let mut config = Configuration::default();
//! config.populate_filterable_fields(&schema, "posts");
//!
//! let params = ParamMap::from_query("status=published&sort=-created_at&limit=20&page=2");
//! let builder = apply(&params, SeaQueryBuilder::for_entity::<post::Entity>(), &config)?;
//! let rows = db.query_all(builder.build(db.get_database_backend())).await?;
//! ```

pub mod builder;
pub mod config;
pub mod errors;
pub mod extract;
pub mod filtering;
pub mod json;
pub mod models;
pub mod params;
pub mod pipeline;
pub mod schema;

pub use builder::{QueryBuilder, RecordingBuilder, Relation, SeaQueryBuilder, SortDirection};
pub use config::{Configuration, FilterType, ParameterNames, SearchMode};
pub use errors::ModifierError;
pub use extract::QueryParams;
pub use filtering::{Modifier, Operator, QueryModifier};
pub use models::CollectionQuery;
pub use params::{ParamMap, ParamValue};
pub use pipeline::apply;
pub use schema::{SchemaInspector, StaticSchema};
