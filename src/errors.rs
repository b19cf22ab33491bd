//! # Error Handling for the Modifier Pipeline
//!
//! Every modifier reports faults through [`ModifierError`]. Errors are raised at the
//! point of detection and abort the modifier that found them; the pipeline stops at
//! the first one. Nothing is retried or silently repaired.
//!
//! All error kinds are caused by client input, so they map to `400 Bad Request` when
//! returned from an axum handler:
//!
//! ```rust,ignore
//! use query_modifier::{apply, Configuration, ModifierError, QueryParams, SeaQueryBuilder};
//!
//! async fn list_posts(QueryParams(params): QueryParams) -> Result<String, ModifierError> {
//!     let builder = apply(&params, SeaQueryBuilder::new("posts"), &config())?;
//!     Ok(builder.to_sql(sea_orm::DatabaseBackend::Sqlite))
//! }
//! ```
//!
//! ## Logging
//!
//! Errors are logged at debug level using the `tracing` crate when they are turned
//! into a response. No output is produced unless the application installs a
//! subscriber.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Faults detected while translating request parameters into builder calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifierError {
    /// A parameter is present but carries no usable data
    NoData {
        /// Name of the request parameter
        parameter: String,
    },

    /// A field name failed whitelist validation
    InvalidField {
        /// The rejected field name
        field: String,
    },

    /// A `has` relation does not exist on the model
    InvalidRelation {
        /// The rejected relation name
        relation: String,
    },

    /// A filter value mixes list and expression shapes
    MalformedFilter {
        /// Field the filter was given for
        field: String,
    },

    /// Search was requested against a model without search capability
    SearchNotSupported {
        /// Name of the model type
        model: String,
    },

    /// A parameter value could not be interpreted (non-numeric page, zero limit, ...)
    InvalidParameter {
        /// Name of the request parameter
        parameter: String,
        /// The rejected raw value
        value: String,
    },

    /// An operator outside the supported set
    InvalidOperator {
        /// The rejected operator token
        operator: String,
    },
}

impl ModifierError {
    pub fn no_data(parameter: impl Into<String>) -> Self {
        Self::NoData {
            parameter: parameter.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
        }
    }

    pub fn invalid_relation(relation: impl Into<String>) -> Self {
        Self::InvalidRelation {
            relation: relation.into(),
        }
    }

    pub fn malformed_filter(field: impl Into<String>) -> Self {
        Self::MalformedFilter {
            field: field.into(),
        }
    }

    pub fn search_not_supported(model: impl Into<String>) -> Self {
        Self::SearchNotSupported {
            model: model.into(),
        }
    }

    pub fn invalid_parameter(parameter: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    pub fn invalid_operator(operator: impl Into<String>) -> Self {
        Self::InvalidOperator {
            operator: operator.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// Every variant is caused by the request, so this is always 400.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Short machine-readable name of the error kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoData { .. } => "no_data",
            Self::InvalidField { .. } => "invalid_field",
            Self::InvalidRelation { .. } => "invalid_relation",
            Self::MalformedFilter { .. } => "malformed_filter",
            Self::SearchNotSupported { .. } => "search_not_supported",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::InvalidOperator { .. } => "invalid_operator",
        }
    }
}

impl fmt::Display for ModifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData { parameter } => write!(
                f,
                "Query parameter '{parameter}' provided, but contains no data"
            ),
            Self::InvalidField { field } => {
                write!(f, "Query string parameter contains an invalid field: {field}")
            }
            Self::InvalidRelation { relation } => {
                write!(f, "Query string parameter contains an invalid relation: {relation}")
            }
            Self::MalformedFilter { field } => write!(
                f,
                "Filter for '{field}' must be an object, not an array. \
                 Arrays are supported but only for inclusion filters"
            ),
            Self::SearchNotSupported { model } => write!(f, "{model} does not support search"),
            Self::InvalidParameter { parameter, value } => {
                write!(f, "Invalid value '{value}' for query parameter '{parameter}'")
            }
            Self::InvalidOperator { operator } => {
                write!(f, "Unsupported filter operator: {operator}")
            }
        }
    }
}

impl std::error::Error for ModifierError {}

/// Error response sent to users
#[derive(Serialize)]
struct ErrorResponse {
    /// Error message
    error: String,
    /// Error kind, e.g. `invalid_field`
    kind: &'static str,
}

impl IntoResponse for ModifierError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        tracing::debug!(
            error = %self,
            kind = self.kind(),
            status = %status,
            "Rejected query parameters"
        );

        let body = ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
        };

        (status, Json(body)).into_response()
    }
}
