//! Merchant handlers

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::Uri,
    response::IntoResponse,
};

use super::{AppState, path_id, query_params};
use crate::core::document::Document;
use crate::core::error::{ApiError, ApiResult};
use crate::core::query::{DEFAULT_MOST_ITEMS_QUANTITY, NameParams, PageParams, QuantityParams};

/// GET /merchants
pub async fn list_merchants(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let params = query_params(params)?;
    let page = params.pagination()?;
    let merchants = state.store.list_merchants(page).await?;
    tracing::debug!(page = page.page(), count = merchants.len(), "listed merchants");
    Ok(Json(Document::collection(&merchants)))
}

/// GET /merchants/{id}
pub async fn get_merchant(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    uri: Uri,
) -> ApiResult<impl IntoResponse> {
    let (id, raw_id) = path_id("Merchant", path, &uri)?;
    let merchant = state
        .store
        .get_merchant(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Merchant", &raw_id))?;
    Ok(Json(Document::single(&merchant)))
}

/// GET /merchants/{id}/items
pub async fn get_merchant_items(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    uri: Uri,
) -> ApiResult<impl IntoResponse> {
    let (id, raw_id) = path_id("Merchant", path, &uri)?;
    if state.store.get_merchant(id).await?.is_none() {
        return Err(ApiError::not_found("Merchant", &raw_id));
    }
    let items = state.store.merchant_items(id).await?;
    Ok(Json(Document::collection(&items)))
}

/// GET /merchants/find?name=
pub async fn find_merchant(
    State(state): State<AppState>,
    params: Result<Query<NameParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let params = query_params(params)?;
    let name = params.required_name()?;
    let merchant = state.store.find_merchant(name).await?.ok_or_else(|| {
        ApiError::RecordNotFound(format!("Couldn't find Merchant with name matching '{}'", name))
    })?;
    Ok(Json(Document::single(&merchant)))
}

/// GET /merchants/most_items?quantity=
pub async fn most_items(
    State(state): State<AppState>,
    params: Result<Query<QuantityParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let params = query_params(params)?;
    let quantity = params.quantity_or(DEFAULT_MOST_ITEMS_QUANTITY)?;
    let ranked = state.store.merchants_with_most_items(quantity).await?;
    Ok(Json(Document::collection(&ranked)))
}
