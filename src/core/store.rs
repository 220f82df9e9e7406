//! Store traits for catalogue, invoice and revenue operations
//!
//! The HTTP layer only talks to `Arc<dyn Store>`. Implementations are free to
//! push the work into SQL ([`PostgresStore`](crate::storage::PostgresStore))
//! or compute it over in-process tables
//! ([`InMemoryStore`](crate::storage::InMemoryStore)); both must produce the
//! same orderings:
//!
//! - listings and pages follow primary-key order;
//! - name searches order by lower-cased name, then id;
//! - ranked aggregates order by value descending, then id ascending.

use async_trait::async_trait;

use crate::core::entity::{
    Invoice, InvoiceItem, Item, ItemChanges, Merchant, NewInvoice, NewInvoiceItem, NewItem,
};
use crate::core::error::StoreResult;
use crate::core::query::{DateRange, ItemFilter, Pagination};
use crate::core::revenue::{
    ItemRevenue, MerchantItemCount, MerchantRevenue, TotalRevenue, UnshippedOrder, WeeklyRevenue,
};

/// Merchants and the items they own
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a merchant
    async fn create_merchant(&self, name: &str) -> StoreResult<Merchant>;

    /// One page of merchants
    async fn list_merchants(&self, page: Pagination) -> StoreResult<Vec<Merchant>>;

    /// Get a merchant by ID
    async fn get_merchant(&self, id: i64) -> StoreResult<Option<Merchant>>;

    /// First merchant whose name contains `fragment`, case-insensitively
    async fn find_merchant(&self, fragment: &str) -> StoreResult<Option<Merchant>>;

    /// Merchants ranked by number of owned items
    async fn merchants_with_most_items(&self, limit: i64) -> StoreResult<Vec<MerchantItemCount>>;

    /// All items of a merchant
    async fn merchant_items(&self, merchant_id: i64) -> StoreResult<Vec<Item>>;

    /// Insert an item; fails with `MissingReference` for an unknown merchant
    async fn create_item(&self, item: NewItem) -> StoreResult<Item>;

    /// One page of items
    async fn list_items(&self, page: Pagination) -> StoreResult<Vec<Item>>;

    /// Get an item by ID
    async fn get_item(&self, id: i64) -> StoreResult<Option<Item>>;

    /// Items matching a name fragment or price range
    async fn find_items(&self, filter: &ItemFilter) -> StoreResult<Vec<Item>>;

    /// Apply changes to an item; `None` when the item does not exist
    async fn update_item(&self, id: i64, changes: ItemChanges) -> StoreResult<Option<Item>>;

    /// Delete an item and cascade to its invoice lines
    ///
    /// Within one atomic operation: remove every invoice item of the item,
    /// then remove each invoice that contained it and has no line left, then
    /// remove the item. Returns `false` when the item does not exist.
    async fn delete_item(&self, id: i64) -> StoreResult<bool>;
}

/// Invoices and their line items
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Insert an invoice
    async fn create_invoice(&self, invoice: NewInvoice) -> StoreResult<Invoice>;

    /// Get an invoice by ID
    async fn get_invoice(&self, id: i64) -> StoreResult<Option<Invoice>>;

    /// Insert an invoice line; both the invoice and the item must exist
    async fn create_invoice_item(&self, line: NewInvoiceItem) -> StoreResult<InvoiceItem>;

    /// All lines of an invoice
    async fn invoice_items(&self, invoice_id: i64) -> StoreResult<Vec<InvoiceItem>>;
}

/// Revenue aggregates over non-cancelled invoices
#[async_trait]
pub trait RevenueStore: Send + Sync {
    /// Total revenue of invoices created within `range`
    async fn total_revenue(&self, range: DateRange) -> StoreResult<TotalRevenue>;

    /// Top items by revenue
    async fn item_revenue(&self, limit: i64) -> StoreResult<Vec<ItemRevenue>>;

    /// Top merchants by revenue
    async fn merchant_revenue(&self, limit: i64) -> StoreResult<Vec<MerchantRevenue>>;

    /// Top packaged invoices by potential revenue
    async fn unshipped_revenue(&self, limit: i64) -> StoreResult<Vec<UnshippedOrder>>;

    /// Revenue per week, oldest first
    async fn weekly_revenue(&self) -> StoreResult<Vec<WeeklyRevenue>>;
}

/// Everything the HTTP layer needs from a backend
pub trait Store: CatalogStore + InvoiceStore + RevenueStore {
    /// Short backend name used in logs
    fn backend(&self) -> &'static str;
}
