//! Axum framework integration for the sift query engine.
//!
//! This crate provides the glue between incoming HTTP requests and
//! [`sift_query`]:
//!
//! - **Extractor**: [`QuerySpec`] builds a [`RawQuery`] from the request
//!   URI's query string using the bracket-notation convention (raw query
//!   strings always need explicit parsing).
//! - **Error mapping**: [`SiftAxumError`] turns validation failures into
//!   `400 Bad Request` responses carrying the path-qualified message,
//!   and programmer errors into an opaque `500`.
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use sift_axum::{QuerySpec, SiftAxumError};
//! use sift_query::{Querier, Schema};
//! use sift_sql::{SqlAdapter, SqlBuilder};
//!
//! async fn list_users(QuerySpec(raw): QuerySpec) -> Result<String, SiftAxumError> {
//!     let mut schema = Schema::new();
//!     schema.filter("age", ">").sort("name").page(true);
//!
//!     let builder = Querier::new(raw, schema, SqlAdapter)
//!         .run(SqlBuilder::table("users"))?;
//!     Ok(builder.to_sql())
//! }
//!
//! let app: Router = Router::new().route("/users", get(list_users));
//! ```

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::response::IntoResponse;
use http::StatusCode;
use http::request::Parts;
use thiserror::Error;
use tracing::debug;

use sift_query::error::{Error, ValidationError};
use sift_query::raw::RawQuery;

/// Errors surfaced to HTTP clients by the query engine.
#[derive(Error, Debug)]
pub enum SiftAxumError {
    /// User input failed validation; maps to `400 Bad Request`.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A required extension point was not supplied by the integrator;
    /// maps to an opaque `500`.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

impl From<Error> for SiftAxumError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(err) => Self::Validation(err),
            Error::NotImplemented(what) => Self::NotImplemented(what),
        }
    }
}

impl IntoResponse for SiftAxumError {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Validation(err) => {
                debug!(path = err.path(), "rejecting query input");
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            Self::NotImplemented(what) => {
                tracing::error!(what, "query engine extension point missing");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Extracts the raw `filter`/`sort`/`page` values from the request URI.
///
/// The query string is parsed with the bracket-notation convention;
/// extraction itself never fails — all validation happens when the
/// querier runs against a schema.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec(pub RawQuery);

impl<S> FromRequestParts<S> for QuerySpec
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or("");
        debug!(query_len = query.len(), "extracting query specification");
        Ok(Self(RawQuery::from_query_str(query)))
    }
}
