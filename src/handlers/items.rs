//! Item handlers: listing, lookup, search and writes

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use validator::Validate;

use super::{AppState, json_body, path_id, query_params, validation_messages};
use crate::core::document::Document;
use crate::core::entity::{ItemChanges, ItemPayload, NewItem};
use crate::core::error::{ApiError, ApiResult};
use crate::core::query::{FindAllParams, PageParams};

/// GET /items
pub async fn list_items(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let params = query_params(params)?;
    let page = params.pagination()?;
    let items = state.store.list_items(page).await?;
    tracing::debug!(page = page.page(), count = items.len(), "listed items");
    Ok(Json(Document::collection(&items)))
}

/// GET /items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    uri: Uri,
) -> ApiResult<impl IntoResponse> {
    let (id, raw_id) = path_id("Item", path, &uri)?;
    let item = state
        .store
        .get_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item", &raw_id))?;
    Ok(Json(Document::single(&item)))
}

/// GET /items/{id}/merchant
pub async fn get_item_merchant(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    uri: Uri,
) -> ApiResult<impl IntoResponse> {
    let (id, raw_id) = path_id("Item", path, &uri)?;
    let item = state
        .store
        .get_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item", &raw_id))?;
    let merchant = state
        .store
        .get_merchant(item.merchant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Merchant", item.merchant_id))?;
    Ok(Json(Document::single(&merchant)))
}

/// GET /items/find_all?name= | ?min_price=&max_price=
pub async fn find_all_items(
    State(state): State<AppState>,
    params: Result<Query<FindAllParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let params = query_params(params)?;
    let filter = params.filter()?;
    let items = state.store.find_items(&filter).await?;
    Ok(Json(Document::collection(&items)))
}

/// POST /items
pub async fn create_item(
    State(state): State<AppState>,
    body: Result<Json<ItemPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = json_body(body)?;
    let new_item = into_new_item(payload)?;
    let item = state.store.create_item(new_item).await?;
    tracing::info!(item_id = item.id, merchant_id = item.merchant_id, "created item");
    Ok((StatusCode::CREATED, Json(Document::single(&item))))
}

/// PATCH|PUT /items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    uri: Uri,
    body: Result<Json<ItemChanges>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let (id, raw_id) = path_id("Item", path, &uri)?;
    let changes = json_body(body)?;
    changes
        .validate()
        .map_err(|e| ApiError::RecordInvalid(validation_messages(&e)))?;

    let item = state
        .store
        .update_item(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Item", &raw_id))?;
    tracing::info!(item_id = item.id, "updated item");
    Ok(Json(Document::single(&item)))
}

/// DELETE /items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    uri: Uri,
) -> ApiResult<StatusCode> {
    let (id, raw_id) = path_id("Item", path, &uri)?;
    if !state.store.delete_item(id).await? {
        return Err(ApiError::not_found("Item", &raw_id));
    }
    tracing::info!(item_id = id, "deleted item");
    Ok(StatusCode::NO_CONTENT)
}

fn into_new_item(payload: ItemPayload) -> ApiResult<NewItem> {
    payload
        .validate()
        .map_err(|e| ApiError::RecordInvalid(validation_messages(&e)))?;

    match payload {
        ItemPayload {
            name: Some(name),
            description: Some(description),
            unit_price: Some(unit_price),
            merchant_id: Some(merchant_id),
        } => Ok(NewItem::new(name, description, unit_price, merchant_id)),
        _ => Err(ApiError::invalid("item is incomplete")),
    }
}
