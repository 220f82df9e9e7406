//! HTTP handlers for the `/api/v1` resources
//!
//! Handlers are plain axum functions over a shared [`AppState`]. They parse
//! raw parameters through [`crate::core::query`], call the store and render
//! the result as a JSON:API [`Document`](crate::core::Document).

pub mod items;
pub mod merchants;
pub mod revenue;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::Uri;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use validator::ValidationErrors;

use crate::core::error::{ApiError, ApiResult};
use crate::core::store::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Parse a path id; anything that is not an integer is treated as missing
pub(crate) fn parse_id(model: &str, raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::not_found(model, raw))
}

/// Resolve the `{id}` segment of `uri`, returning the id and its raw text
///
/// Segments the router cannot decode (invalid UTF-8) are reported as a
/// missing record, the same as any other non-integer id.
pub(crate) fn path_id(
    model: &str,
    path: Result<Path<String>, PathRejection>,
    uri: &Uri,
) -> ApiResult<(i64, String)> {
    match path {
        Ok(Path(raw)) => parse_id(model, &raw).map(|id| (id, raw)),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "undecodable path id");
            let collection = format!("{}s", model.to_lowercase());
            let raw = uri
                .path()
                .split('/')
                .skip_while(|segment| *segment != collection)
                .nth(1)
                .unwrap_or_default();
            Err(ApiError::not_found(model, raw))
        }
    }
}

/// Unwrap a query string, mapping the framework rejection into the error envelope
pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::InvalidParameter(e.body_text()))
}

/// Unwrap a JSON body, mapping the framework rejection into the error envelope
///
/// Malformed JSON is a bad request; well-formed JSON of the wrong shape is an
/// unprocessable record.
pub(crate) fn json_body<T: DeserializeOwned>(
    body: Result<Json<T>, JsonRejection>,
) -> ApiResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::JsonDataError(e)) => Err(ApiError::invalid(e.body_text())),
        Err(other) => Err(ApiError::InvalidParameter(other.body_text())),
    }
}

/// Flatten validator output into one message per failed rule, ordered by field
pub(crate) fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect()
}
