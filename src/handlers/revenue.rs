//! Revenue report handlers

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};

use super::{AppState, query_params};
use crate::core::document::Document;
use crate::core::error::ApiResult;
use crate::core::query::{DEFAULT_REVENUE_QUANTITY, DateRangeParams, QuantityParams};

/// GET /revenue?start=&end=
pub async fn total_revenue(
    State(state): State<AppState>,
    params: Result<Query<DateRangeParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let params = query_params(params)?;
    let range = params.range()?;
    let total = state.store.total_revenue(range).await?;
    Ok(Json(Document::single(&total)))
}

/// GET /revenue/items?quantity=
pub async fn item_revenue(
    State(state): State<AppState>,
    params: Result<Query<QuantityParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let params = query_params(params)?;
    let quantity = params.quantity_or(DEFAULT_REVENUE_QUANTITY)?;
    let ranked = state.store.item_revenue(quantity).await?;
    Ok(Json(Document::collection(&ranked)))
}

/// GET /revenue/merchants?quantity=
pub async fn merchant_revenue(
    State(state): State<AppState>,
    params: Result<Query<QuantityParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let params = query_params(params)?;
    let quantity = params.quantity_or(DEFAULT_REVENUE_QUANTITY)?;
    let ranked = state.store.merchant_revenue(quantity).await?;
    Ok(Json(Document::collection(&ranked)))
}

/// GET /revenue/unshipped?quantity=
pub async fn unshipped_revenue(
    State(state): State<AppState>,
    params: Result<Query<QuantityParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let params = query_params(params)?;
    let quantity = params.quantity_or(DEFAULT_REVENUE_QUANTITY)?;
    let ranked = state.store.unshipped_revenue(quantity).await?;
    Ok(Json(Document::collection(&ranked)))
}

/// GET /revenue/weekly
pub async fn weekly_revenue(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let weeks = state.store.weekly_revenue().await?;
    Ok(Json(Document::collection(&weeks)))
}
