//! # Emporium
//!
//! A JSON:API service over a small e-commerce catalogue: merchants, the items
//! they sell, and revenue reports computed from invoices.
//!
//! ## Features
//!
//! - **JSON:API documents**: `{ data: { id, type, attributes } }` for every response
//! - **Pagination**: `page` / `per_page` windows over primary-key order
//! - **Search**: merchants by name fragment, items by name or price range
//! - **Revenue reports**: totals, top items, top merchants, unshipped orders, weekly buckets
//! - **Pluggable storage**: in-memory tables or PostgreSQL (`postgres` feature)
//! - **Cascading deletes**: removing an item cleans up invoices left empty
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use emporium::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     ServerBuilder::new()
//!         .with_config(ServerConfig::default())
//!         .with_store(InMemoryStore::new())
//!         .serve()
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod handlers;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        ApiError, ApiResult, CatalogStore, DateRange, Document, Invoice, InvoiceItem,
        InvoiceStatus, InvoiceStore, Item, ItemChanges, ItemFilter, JsonApiResource, Merchant,
        NewInvoice, NewInvoiceItem, NewItem, Pagination, RevenueStore, Store, StoreError,
        StoreResult,
    };

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresStore;

    // === Config ===
    pub use crate::config::ServerConfig;

    // === Server ===
    pub use crate::handlers::AppState;
    pub use crate::server::ServerBuilder;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, NaiveDate, Utc};
}
