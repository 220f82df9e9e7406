//! In-memory implementation of the store traits for testing and development

use crate::core::entity::{
    Invoice, InvoiceItem, InvoiceStatus, Item, ItemChanges, Merchant, NewInvoice, NewInvoiceItem,
    NewItem, round_to_cents,
};
use crate::core::error::{StoreError, StoreResult};
use crate::core::query::{DateRange, ItemFilter, Pagination};
use crate::core::revenue::{
    ItemRevenue, MerchantItemCount, MerchantRevenue, TotalRevenue, UnshippedOrder, WeeklyRevenue,
    rank_desc, week_start,
};
use crate::core::store::{CatalogStore, InvoiceStore, RevenueStore, Store};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The four tables, keyed by primary key so iteration follows id order
#[derive(Default)]
struct Tables {
    merchants: BTreeMap<i64, Merchant>,
    items: BTreeMap<i64, Item>,
    invoices: BTreeMap<i64, Invoice>,
    invoice_items: BTreeMap<i64, InvoiceItem>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Lines of invoices that count as revenue, paired with their invoice
    fn revenue_lines(&self) -> impl Iterator<Item = (&InvoiceItem, &Invoice)> {
        self.invoice_items.values().filter_map(|line| {
            self.invoices
                .get(&line.invoice_id)
                .filter(|invoice| invoice.status.counts_as_revenue())
                .map(|invoice| (line, invoice))
        })
    }

    fn revenue_by_item(&self) -> HashMap<i64, f64> {
        let mut totals = HashMap::new();
        for (line, _) in self.revenue_lines() {
            *totals.entry(line.item_id).or_insert(0.0) += line.line_total();
        }
        totals
    }

    fn sorted_by_name<'a, T: 'a>(
        records: impl Iterator<Item = &'a T>,
        key: impl Fn(&T) -> (String, i64),
    ) -> Vec<T>
    where
        T: Clone,
    {
        let mut out: Vec<T> = records.cloned().collect();
        out.sort_by_cached_key(|r| key(r));
        out
    }
}

/// In-memory store implementation
///
/// Useful for testing and development. A single `RwLock` guards all tables,
/// so a cascading delete is applied atomically under one write guard.
/// Identifiers come from one shared sequence and start at 1.
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for InMemoryStore {
    fn backend(&self) -> &'static str {
        "in-memory"
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn create_merchant(&self, name: &str) -> StoreResult<Merchant> {
        let mut tables = self.write()?;
        let merchant = Merchant {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.merchants.insert(merchant.id, merchant.clone());
        Ok(merchant)
    }

    async fn list_merchants(&self, page: Pagination) -> StoreResult<Vec<Merchant>> {
        let tables = self.read()?;
        Ok(page.apply(tables.merchants.values().cloned()))
    }

    async fn get_merchant(&self, id: i64) -> StoreResult<Option<Merchant>> {
        let tables = self.read()?;
        Ok(tables.merchants.get(&id).cloned())
    }

    async fn find_merchant(&self, fragment: &str) -> StoreResult<Option<Merchant>> {
        let tables = self.read()?;
        let needle = fragment.to_lowercase();
        let matches = tables
            .merchants
            .values()
            .filter(|m| m.name.to_lowercase().contains(&needle));
        Ok(Tables::sorted_by_name(matches, |m| (m.name.to_lowercase(), m.id))
            .into_iter()
            .next())
    }

    async fn merchants_with_most_items(&self, limit: i64) -> StoreResult<Vec<MerchantItemCount>> {
        let tables = self.read()?;
        let mut counts: HashMap<i64, i64> = HashMap::new();
        for item in tables.items.values() {
            *counts.entry(item.merchant_id).or_insert(0) += 1;
        }

        let mut ranked: Vec<MerchantItemCount> = counts
            .into_iter()
            .filter_map(|(merchant_id, count)| {
                tables.merchants.get(&merchant_id).map(|merchant| MerchantItemCount {
                    merchant: merchant.clone(),
                    count,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.merchant.id.cmp(&b.merchant.id)));
        ranked.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(ranked)
    }

    async fn merchant_items(&self, merchant_id: i64) -> StoreResult<Vec<Item>> {
        let tables = self.read()?;
        Ok(tables
            .items
            .values()
            .filter(|item| item.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn create_item(&self, new_item: NewItem) -> StoreResult<Item> {
        let mut tables = self.write()?;
        if !tables.merchants.contains_key(&new_item.merchant_id) {
            return Err(StoreError::MissingReference {
                entity: "Merchant",
                id: new_item.merchant_id,
            });
        }

        let item = Item {
            id: tables.next_id(),
            name: new_item.name,
            description: new_item.description,
            unit_price: round_to_cents(new_item.unit_price),
            merchant_id: new_item.merchant_id,
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn list_items(&self, page: Pagination) -> StoreResult<Vec<Item>> {
        let tables = self.read()?;
        Ok(page.apply(tables.items.values().cloned()))
    }

    async fn get_item(&self, id: i64) -> StoreResult<Option<Item>> {
        let tables = self.read()?;
        Ok(tables.items.get(&id).cloned())
    }

    async fn find_items(&self, filter: &ItemFilter) -> StoreResult<Vec<Item>> {
        let tables = self.read()?;
        let matches = tables
            .items
            .values()
            .filter(|item| filter.matches(&item.name, item.unit_price));
        Ok(Tables::sorted_by_name(matches, |i| (i.name.to_lowercase(), i.id)))
    }

    async fn update_item(&self, id: i64, changes: ItemChanges) -> StoreResult<Option<Item>> {
        let mut tables = self.write()?;
        match changes.merchant_id {
            Some(merchant_id) if !tables.merchants.contains_key(&merchant_id) => {
                return Err(StoreError::MissingReference {
                    entity: "Merchant",
                    id: merchant_id,
                });
            }
            _ => {}
        }

        let Some(item) = tables.items.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(item);
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if tables.items.remove(&id).is_none() {
            return Ok(false);
        }

        let touched: BTreeSet<i64> = tables
            .invoice_items
            .values()
            .filter(|line| line.item_id == id)
            .map(|line| line.invoice_id)
            .collect();
        tables.invoice_items.retain(|_, line| line.item_id != id);

        let still_used: BTreeSet<i64> = tables
            .invoice_items
            .values()
            .map(|line| line.invoice_id)
            .filter(|invoice_id| touched.contains(invoice_id))
            .collect();
        for invoice_id in touched.difference(&still_used) {
            tables.invoices.remove(invoice_id);
        }

        tracing::debug!(
            item_id = id,
            removed_invoices = touched.len() - still_used.len(),
            "deleted item"
        );
        Ok(true)
    }
}

#[async_trait]
impl InvoiceStore for InMemoryStore {
    async fn create_invoice(&self, new_invoice: NewInvoice) -> StoreResult<Invoice> {
        let mut tables = self.write()?;
        let invoice = Invoice {
            id: tables.next_id(),
            status: new_invoice.status,
            created_at: new_invoice.created_at,
        };
        tables.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn get_invoice(&self, id: i64) -> StoreResult<Option<Invoice>> {
        let tables = self.read()?;
        Ok(tables.invoices.get(&id).cloned())
    }

    async fn create_invoice_item(&self, new_line: NewInvoiceItem) -> StoreResult<InvoiceItem> {
        let mut tables = self.write()?;
        if !tables.invoices.contains_key(&new_line.invoice_id) {
            return Err(StoreError::MissingReference {
                entity: "Invoice",
                id: new_line.invoice_id,
            });
        }
        if !tables.items.contains_key(&new_line.item_id) {
            return Err(StoreError::MissingReference {
                entity: "Item",
                id: new_line.item_id,
            });
        }

        let line = InvoiceItem {
            id: tables.next_id(),
            invoice_id: new_line.invoice_id,
            item_id: new_line.item_id,
            quantity: new_line.quantity,
            unit_price: new_line.unit_price,
        };
        tables.invoice_items.insert(line.id, line.clone());
        Ok(line)
    }

    async fn invoice_items(&self, invoice_id: i64) -> StoreResult<Vec<InvoiceItem>> {
        let tables = self.read()?;
        Ok(tables
            .invoice_items
            .values()
            .filter(|line| line.invoice_id == invoice_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RevenueStore for InMemoryStore {
    async fn total_revenue(&self, range: DateRange) -> StoreResult<TotalRevenue> {
        let tables = self.read()?;
        let revenue = tables
            .revenue_lines()
            .filter(|(_, invoice)| range.contains(invoice.created_at))
            .map(|(line, _)| line.line_total())
            .sum();
        Ok(TotalRevenue { revenue })
    }

    async fn item_revenue(&self, limit: i64) -> StoreResult<Vec<ItemRevenue>> {
        let tables = self.read()?;
        let mut ranked: Vec<ItemRevenue> = tables
            .revenue_by_item()
            .into_iter()
            .filter_map(|(item_id, revenue)| {
                tables.items.get(&item_id).map(|item| ItemRevenue {
                    item: item.clone(),
                    revenue,
                })
            })
            .collect();
        rank_desc(&mut ranked, |r| (r.revenue, r.item.id));
        ranked.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(ranked)
    }

    async fn merchant_revenue(&self, limit: i64) -> StoreResult<Vec<MerchantRevenue>> {
        let tables = self.read()?;
        let mut by_merchant: HashMap<i64, f64> = HashMap::new();
        for (item_id, revenue) in tables.revenue_by_item() {
            if let Some(item) = tables.items.get(&item_id) {
                *by_merchant.entry(item.merchant_id).or_insert(0.0) += revenue;
            }
        }

        let mut ranked: Vec<MerchantRevenue> = by_merchant
            .into_iter()
            .filter_map(|(merchant_id, revenue)| {
                tables.merchants.get(&merchant_id).map(|merchant| MerchantRevenue {
                    merchant: merchant.clone(),
                    revenue,
                })
            })
            .collect();
        rank_desc(&mut ranked, |r| (r.revenue, r.merchant.id));
        ranked.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(ranked)
    }

    async fn unshipped_revenue(&self, limit: i64) -> StoreResult<Vec<UnshippedOrder>> {
        let tables = self.read()?;
        let mut by_invoice: HashMap<i64, f64> = HashMap::new();
        for (line, invoice) in tables.revenue_lines() {
            if invoice.status == InvoiceStatus::Packaged {
                *by_invoice.entry(invoice.id).or_insert(0.0) += line.line_total();
            }
        }

        let mut ranked: Vec<UnshippedOrder> = by_invoice
            .into_iter()
            .map(|(invoice_id, potential_revenue)| UnshippedOrder {
                invoice_id,
                potential_revenue,
            })
            .collect();
        rank_desc(&mut ranked, |r| (r.potential_revenue, r.invoice_id));
        ranked.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(ranked)
    }

    async fn weekly_revenue(&self) -> StoreResult<Vec<WeeklyRevenue>> {
        let tables = self.read()?;
        let mut weeks = BTreeMap::new();
        for (line, invoice) in tables.revenue_lines() {
            let week = week_start(invoice.created_at.date_naive());
            *weeks.entry(week).or_insert(0.0) += line.line_total();
        }

        Ok(weeks
            .into_iter()
            .map(|(week, revenue)| WeeklyRevenue { week, revenue })
            .collect())
    }
}
