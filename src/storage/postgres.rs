//! PostgreSQL storage backend using sqlx.
//!
//! Provides [`PostgresStore`], an implementation of every store trait backed
//! by a `sqlx::PgPool`. Aggregates, orderings and the cascading delete are
//! all pushed down into SQL.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! emporium = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Schema
//!
//! Tables are created by the migrations in `migrations/`, embedded at build
//! time and applied by [`PostgresStore::migrate`]. Money columns are
//! `NUMERIC(12, 2)`; they are read back as `FLOAT8` so that rows decode into
//! plain `f64` values.

use crate::core::entity::{
    Invoice, InvoiceItem, InvoiceStatus, Item, ItemChanges, Merchant, NewInvoice, NewInvoiceItem,
    NewItem, round_to_cents,
};
use crate::core::error::{StoreError, StoreResult};
use crate::core::query::{DateRange, ItemFilter, Pagination};
use crate::core::revenue::{
    ItemRevenue, MerchantItemCount, MerchantRevenue, TotalRevenue, UnshippedOrder, WeeklyRevenue,
};
use crate::core::store::{CatalogStore, InvoiceStore, RevenueStore, Store};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const ITEM_COLUMNS: &str = "id, name, description, unit_price::FLOAT8, merchant_id";

/// Only invoices that count as revenue
const REVENUE_JOIN: &str = "FROM invoice_items ii \
     JOIN invoices inv ON inv.id = ii.invoice_id \
     WHERE inv.status <> 'cancelled'";

type MerchantTuple = (i64, String);
type ItemTuple = (i64, String, String, f64, i64);
type InvoiceTuple = (i64, String, DateTime<Utc>);
type InvoiceItemTuple = (i64, i64, i64, i64, f64);

fn row_to_merchant((id, name): MerchantTuple) -> Merchant {
    Merchant { id, name }
}

fn row_to_item((id, name, description, unit_price, merchant_id): ItemTuple) -> Item {
    Item {
        id,
        name,
        description,
        unit_price,
        merchant_id,
    }
}

fn row_to_invoice((id, status, created_at): InvoiceTuple) -> StoreResult<Invoice> {
    Ok(Invoice {
        id,
        status: status.parse()?,
        created_at,
    })
}

fn row_to_invoice_item(
    (id, invoice_id, item_id, quantity, unit_price): InvoiceItemTuple,
) -> InvoiceItem {
    InvoiceItem {
        id,
        invoice_id,
        item_id,
        quantity,
        unit_price,
    }
}

/// Store backed by PostgreSQL
///
/// # Example
///
/// ```rust,ignore
/// use emporium::storage::PostgresStore;
///
/// let store = PostgresStore::connect("postgres://postgres@localhost/emporium", 5).await?;
/// store.migrate().await?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url`
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        tracing::info!(max_connections, "connected to postgres");
        Ok(Self::new(pool))
    }

    /// Apply pending migrations (idempotent)
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn merchant_exists(&self, id: i64) -> StoreResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM merchants WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

impl Store for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn create_merchant(&self, name: &str) -> StoreResult<Merchant> {
        let row = sqlx::query_as::<_, MerchantTuple>(
            "INSERT INTO merchants (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row_to_merchant(row))
    }

    async fn list_merchants(&self, page: Pagination) -> StoreResult<Vec<Merchant>> {
        let rows = sqlx::query_as::<_, MerchantTuple>(
            "SELECT id, name FROM merchants ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_merchant).collect())
    }

    async fn get_merchant(&self, id: i64) -> StoreResult<Option<Merchant>> {
        let row = sqlx::query_as::<_, MerchantTuple>("SELECT id, name FROM merchants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_merchant))
    }

    async fn find_merchant(&self, fragment: &str) -> StoreResult<Option<Merchant>> {
        let row = sqlx::query_as::<_, MerchantTuple>(
            "SELECT id, name FROM merchants \
             WHERE strpos(lower(name), lower($1)) > 0 \
             ORDER BY lower(name) COLLATE \"C\", id LIMIT 1",
        )
        .bind(fragment)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_merchant))
    }

    async fn merchants_with_most_items(&self, limit: i64) -> StoreResult<Vec<MerchantItemCount>> {
        let rows = sqlx::query_as::<_, (i64, String, i64)>(
            "SELECT m.id, m.name, COUNT(it.id) AS item_count \
             FROM merchants m JOIN items it ON it.merchant_id = m.id \
             GROUP BY m.id, m.name \
             ORDER BY item_count DESC, m.id ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, count)| MerchantItemCount {
                merchant: Merchant { id, name },
                count,
            })
            .collect())
    }

    async fn merchant_items(&self, merchant_id: i64) -> StoreResult<Vec<Item>> {
        let sql = format!(
            "SELECT {} FROM items WHERE merchant_id = $1 ORDER BY id",
            ITEM_COLUMNS
        );
        let rows = sqlx::query_as::<_, ItemTuple>(&sql)
            .bind(merchant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(row_to_item).collect())
    }

    async fn create_item(&self, item: NewItem) -> StoreResult<Item> {
        let sql = format!(
            "INSERT INTO items (name, description, unit_price, merchant_id) \
             SELECT $1::TEXT, $2::TEXT, $3::FLOAT8::NUMERIC(12, 2), $4::BIGINT \
             WHERE EXISTS (SELECT 1 FROM merchants WHERE id = $4::BIGINT) \
             RETURNING {}",
            ITEM_COLUMNS
        );
        let row = sqlx::query_as::<_, ItemTuple>(&sql)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.unit_price)
            .bind(item.merchant_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_item).ok_or(StoreError::MissingReference {
            entity: "Merchant",
            id: item.merchant_id,
        })
    }

    async fn list_items(&self, page: Pagination) -> StoreResult<Vec<Item>> {
        let sql = format!(
            "SELECT {} FROM items ORDER BY id LIMIT $1 OFFSET $2",
            ITEM_COLUMNS
        );
        let rows = sqlx::query_as::<_, ItemTuple>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(row_to_item).collect())
    }

    async fn get_item(&self, id: i64) -> StoreResult<Option<Item>> {
        let sql = format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS);
        let row = sqlx::query_as::<_, ItemTuple>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_item))
    }

    async fn find_items(&self, filter: &ItemFilter) -> StoreResult<Vec<Item>> {
        let rows = match filter {
            ItemFilter::Name(fragment) => {
                let sql = format!(
                    "SELECT {} FROM items \
                     WHERE strpos(lower(name), lower($1)) > 0 \
                     ORDER BY lower(name) COLLATE \"C\", id",
                    ITEM_COLUMNS
                );
                sqlx::query_as::<_, ItemTuple>(&sql)
                    .bind(fragment)
                    .fetch_all(&self.pool)
                    .await?
            }
            ItemFilter::Price { min, max } => {
                let sql = format!(
                    "SELECT {} FROM items \
                     WHERE ($1::FLOAT8 IS NULL OR unit_price::FLOAT8 >= $1) \
                       AND ($2::FLOAT8 IS NULL OR unit_price::FLOAT8 <= $2) \
                     ORDER BY lower(name) COLLATE \"C\", id",
                    ITEM_COLUMNS
                );
                sqlx::query_as::<_, ItemTuple>(&sql)
                    .bind(*min)
                    .bind(*max)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(row_to_item).collect())
    }

    async fn update_item(&self, id: i64, changes: ItemChanges) -> StoreResult<Option<Item>> {
        if let Some(merchant_id) = changes.merchant_id {
            if !self.merchant_exists(merchant_id).await? {
                return Err(StoreError::MissingReference {
                    entity: "Merchant",
                    id: merchant_id,
                });
            }
        }

        let sql = format!(
            "UPDATE items SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                unit_price = COALESCE($4::FLOAT8::NUMERIC(12, 2), unit_price), \
                merchant_id = COALESCE($5, merchant_id), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {}",
            ITEM_COLUMNS
        );
        let row = sqlx::query_as::<_, ItemTuple>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.description)
            .bind(changes.unit_price.map(round_to_cents))
            .bind(changes.merchant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_item))
    }

    async fn delete_item(&self, id: i64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let touched: Vec<i64> = sqlx::query_scalar(
            "DELETE FROM invoice_items WHERE item_id = $1 RETURNING invoice_id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let removed_invoices = sqlx::query(
            "DELETE FROM invoices inv \
             WHERE inv.id = ANY($1) \
               AND NOT EXISTS (SELECT 1 FROM invoice_items ii WHERE ii.invoice_id = inv.id)",
        )
        .bind(&touched)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let removed_items = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed_items == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        tracing::debug!(item_id = id, removed_invoices, "deleted item");
        Ok(true)
    }
}

#[async_trait]
impl InvoiceStore for PostgresStore {
    async fn create_invoice(&self, invoice: NewInvoice) -> StoreResult<Invoice> {
        let row = sqlx::query_as::<_, InvoiceTuple>(
            "INSERT INTO invoices (status, created_at, updated_at) VALUES ($1, $2, $2) \
             RETURNING id, status, created_at",
        )
        .bind(invoice.status.as_str())
        .bind(invoice.created_at)
        .fetch_one(&self.pool)
        .await?;
        row_to_invoice(row)
    }

    async fn get_invoice(&self, id: i64) -> StoreResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceTuple>(
            "SELECT id, status, created_at FROM invoices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_invoice).transpose()
    }

    async fn create_invoice_item(&self, line: NewInvoiceItem) -> StoreResult<InvoiceItem> {
        let row = sqlx::query_as::<_, InvoiceItemTuple>(
            "INSERT INTO invoice_items (invoice_id, item_id, quantity, unit_price) \
             SELECT $1::BIGINT, $2::BIGINT, $3::BIGINT, $4::FLOAT8::NUMERIC(12, 2) \
             WHERE EXISTS (SELECT 1 FROM invoices WHERE id = $1::BIGINT) \
               AND EXISTS (SELECT 1 FROM items WHERE id = $2::BIGINT) \
             RETURNING id, invoice_id, item_id, quantity, unit_price::FLOAT8",
        )
        .bind(line.invoice_id)
        .bind(line.item_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row_to_invoice_item(row)),
            None if self.get_invoice(line.invoice_id).await?.is_none() => {
                Err(StoreError::MissingReference {
                    entity: "Invoice",
                    id: line.invoice_id,
                })
            }
            None => Err(StoreError::MissingReference {
                entity: "Item",
                id: line.item_id,
            }),
        }
    }

    async fn invoice_items(&self, invoice_id: i64) -> StoreResult<Vec<InvoiceItem>> {
        let rows = sqlx::query_as::<_, InvoiceItemTuple>(
            "SELECT id, invoice_id, item_id, quantity, unit_price::FLOAT8 \
             FROM invoice_items WHERE invoice_id = $1 ORDER BY id",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_invoice_item).collect())
    }
}

#[async_trait]
impl RevenueStore for PostgresStore {
    async fn total_revenue(&self, range: DateRange) -> StoreResult<TotalRevenue> {
        let sql = format!(
            "SELECT COALESCE(SUM(ii.quantity * ii.unit_price), 0)::FLOAT8 {} \
               AND ($1::TIMESTAMPTZ IS NULL OR inv.created_at >= $1) \
               AND ($2::TIMESTAMPTZ IS NULL OR inv.created_at < $2)",
            REVENUE_JOIN
        );
        let revenue = sqlx::query_scalar::<_, f64>(&sql)
            .bind(range.lower_bound())
            .bind(range.upper_bound())
            .fetch_one(&self.pool)
            .await?;
        Ok(TotalRevenue { revenue })
    }

    async fn item_revenue(&self, limit: i64) -> StoreResult<Vec<ItemRevenue>> {
        let rows = sqlx::query_as::<_, (i64, String, String, f64, i64, f64)>(
            "SELECT it.id, it.name, it.description, it.unit_price::FLOAT8, it.merchant_id, \
                    SUM(ii.quantity * ii.unit_price)::FLOAT8 AS revenue \
             FROM invoice_items ii \
             JOIN invoices inv ON inv.id = ii.invoice_id \
             JOIN items it ON it.id = ii.item_id \
             WHERE inv.status <> 'cancelled' \
             GROUP BY it.id \
             ORDER BY revenue DESC, it.id ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, description, unit_price, merchant_id, revenue)| ItemRevenue {
                item: row_to_item((id, name, description, unit_price, merchant_id)),
                revenue,
            })
            .collect())
    }

    async fn merchant_revenue(&self, limit: i64) -> StoreResult<Vec<MerchantRevenue>> {
        let rows = sqlx::query_as::<_, (i64, String, f64)>(
            "SELECT m.id, m.name, SUM(ii.quantity * ii.unit_price)::FLOAT8 AS revenue \
             FROM invoice_items ii \
             JOIN invoices inv ON inv.id = ii.invoice_id \
             JOIN items it ON it.id = ii.item_id \
             JOIN merchants m ON m.id = it.merchant_id \
             WHERE inv.status <> 'cancelled' \
             GROUP BY m.id, m.name \
             ORDER BY revenue DESC, m.id ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, revenue)| MerchantRevenue {
                merchant: Merchant { id, name },
                revenue,
            })
            .collect())
    }

    async fn unshipped_revenue(&self, limit: i64) -> StoreResult<Vec<UnshippedOrder>> {
        let rows = sqlx::query_as::<_, (i64, f64)>(
            "SELECT inv.id, SUM(ii.quantity * ii.unit_price)::FLOAT8 AS potential_revenue \
             FROM invoice_items ii \
             JOIN invoices inv ON inv.id = ii.invoice_id \
             WHERE inv.status = $1 \
             GROUP BY inv.id \
             ORDER BY potential_revenue DESC, inv.id ASC LIMIT $2",
        )
        .bind(InvoiceStatus::Packaged.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(invoice_id, potential_revenue)| UnshippedOrder {
                invoice_id,
                potential_revenue,
            })
            .collect())
    }

    async fn weekly_revenue(&self) -> StoreResult<Vec<WeeklyRevenue>> {
        let sql = format!(
            "SELECT date_trunc('week', inv.created_at AT TIME ZONE 'UTC')::DATE AS week, \
                    SUM(ii.quantity * ii.unit_price)::FLOAT8 AS revenue \
             {} \
             GROUP BY week ORDER BY week",
            REVENUE_JOIN
        );
        let rows = sqlx::query_as::<_, (NaiveDate, f64)>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(week, revenue)| WeeklyRevenue { week, revenue })
            .collect())
    }
}
