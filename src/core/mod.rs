//! Core module containing the domain records, store traits and API plumbing

pub mod document;
pub mod entity;
pub mod error;
pub mod query;
pub mod revenue;
pub mod store;

pub use document::{Document, JsonApiResource, Resource};
pub use entity::{
    Invoice, InvoiceItem, InvoiceStatus, Item, ItemChanges, ItemPayload, Merchant, NewInvoice,
    NewInvoiceItem, NewItem,
};
pub use error::{ApiError, ApiResult, StoreError, StoreResult};
pub use query::{DateRange, ItemFilter, Pagination};
pub use store::{CatalogStore, InvoiceStore, RevenueStore, Store};
