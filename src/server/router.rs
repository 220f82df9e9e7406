//! Route table for the JSON:API endpoints

use crate::core::error::ApiError;
use crate::handlers::{AppState, items, merchants, revenue};
use axum::{Json, Router, http::Uri, routing::get};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Version prefix of every resource route
pub const API_PREFIX: &str = "/api/v1";

/// Build the resource routes (without the version prefix)
///
/// - GET /merchants, /merchants/find, /merchants/most_items
/// - GET /merchants/{id}, /merchants/{id}/items
/// - GET|POST /items, GET /items/find_all
/// - GET|PATCH|PUT|DELETE /items/{id}, GET /items/{id}/merchant
/// - GET /revenue, /revenue/items, /revenue/merchants, /revenue/unshipped, /revenue/weekly
pub fn build_api_routes(state: AppState) -> Router {
    Router::new()
        .route("/merchants", get(merchants::list_merchants))
        .route("/merchants/find", get(merchants::find_merchant))
        .route("/merchants/most_items", get(merchants::most_items))
        .route("/merchants/{id}", get(merchants::get_merchant))
        .route("/merchants/{id}/items", get(merchants::get_merchant_items))
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/find_all", get(items::find_all_items))
        .route(
            "/items/{id}",
            get(items::get_item)
                .patch(items::update_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/items/{id}/merchant", get(items::get_item_merchant))
        .route("/revenue", get(revenue::total_revenue))
        .route("/revenue/items", get(revenue::item_revenue))
        .route("/revenue/merchants", get(revenue::merchant_revenue))
        .route("/revenue/unshipped", get(revenue::unshipped_revenue))
        .route("/revenue/weekly", get(revenue::weekly_revenue))
        .with_state(state)
}

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "emporium"
    }))
}

async fn unknown_route(uri: Uri) -> ApiError {
    ApiError::RecordNotFound(format!("No route matches {}", uri.path()))
}

/// Assemble the full application router
///
/// Health routes, the versioned API, then any custom routes. Unknown paths
/// answer with the error envelope.
pub fn build_router(state: AppState, custom_routes: Vec<Router>, cors: bool) -> Router {
    let mut app = health_routes().nest(API_PREFIX, build_api_routes(state));

    for custom_router in custom_routes {
        app = app.merge(custom_router);
    }

    let app = app.fallback(unknown_route).layer(TraceLayer::new_for_http());
    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
