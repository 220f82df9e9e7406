//! Revenue aggregates and their JSON:API shapes
//!
//! Revenue is `quantity * unit_price` summed over invoice line items whose
//! invoice is not cancelled. The stores compute the aggregates; this module
//! only defines what they return and how it is rendered.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::core::document::JsonApiResource;
use crate::core::entity::{Item, Merchant};

/// Total revenue over a date range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalRevenue {
    pub revenue: f64,
}

/// An item together with the revenue it generated
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRevenue {
    pub item: Item,
    pub revenue: f64,
}

/// A merchant together with the revenue of all its items
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantRevenue {
    pub merchant: Merchant,
    pub revenue: f64,
}

/// A packaged (not yet shipped) invoice and what it would bring in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnshippedOrder {
    pub invoice_id: i64,
    pub potential_revenue: f64,
}

/// Revenue of one week; `week` is the Monday the week starts on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeeklyRevenue {
    pub week: NaiveDate,
    pub revenue: f64,
}

/// A merchant and the number of items it owns
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantItemCount {
    pub merchant: Merchant,
    pub count: i64,
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// Descending by value, ascending by id on ties
pub(crate) fn rank_desc<T>(records: &mut [T], key: impl Fn(&T) -> (f64, i64)) {
    records.sort_by(|a, b| {
        let (va, ia) = key(a);
        let (vb, ib) = key(b);
        vb.total_cmp(&va).then(ia.cmp(&ib))
    });
}

// ---------------------------------------------------------------------------
// JSON:API shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RevenueAttributes {
    pub revenue: f64,
}

impl JsonApiResource for TotalRevenue {
    const RESOURCE_TYPE: &'static str = "revenue";
    type Attributes = RevenueAttributes;

    fn resource_id(&self) -> Option<String> {
        None
    }

    fn attributes(&self) -> RevenueAttributes {
        RevenueAttributes {
            revenue: self.revenue,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemRevenueAttributes {
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub merchant_id: i64,
    pub revenue: f64,
}

impl JsonApiResource for ItemRevenue {
    const RESOURCE_TYPE: &'static str = "item_revenue";
    type Attributes = ItemRevenueAttributes;

    fn resource_id(&self) -> Option<String> {
        Some(self.item.id.to_string())
    }

    fn attributes(&self) -> ItemRevenueAttributes {
        ItemRevenueAttributes {
            name: self.item.name.clone(),
            description: self.item.description.clone(),
            unit_price: self.item.unit_price,
            merchant_id: self.item.merchant_id,
            revenue: self.revenue,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MerchantRevenueAttributes {
    pub name: String,
    pub revenue: f64,
}

impl JsonApiResource for MerchantRevenue {
    const RESOURCE_TYPE: &'static str = "merchant_name_revenue";
    type Attributes = MerchantRevenueAttributes;

    fn resource_id(&self) -> Option<String> {
        Some(self.merchant.id.to_string())
    }

    fn attributes(&self) -> MerchantRevenueAttributes {
        MerchantRevenueAttributes {
            name: self.merchant.name.clone(),
            revenue: self.revenue,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnshippedOrderAttributes {
    pub potential_revenue: f64,
}

impl JsonApiResource for UnshippedOrder {
    const RESOURCE_TYPE: &'static str = "unshipped_order";
    type Attributes = UnshippedOrderAttributes;

    fn resource_id(&self) -> Option<String> {
        Some(self.invoice_id.to_string())
    }

    fn attributes(&self) -> UnshippedOrderAttributes {
        UnshippedOrderAttributes {
            potential_revenue: self.potential_revenue,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyRevenueAttributes {
    pub week: String,
    pub revenue: f64,
}

impl JsonApiResource for WeeklyRevenue {
    const RESOURCE_TYPE: &'static str = "weekly_revenue";
    type Attributes = WeeklyRevenueAttributes;

    fn resource_id(&self) -> Option<String> {
        None
    }

    fn attributes(&self) -> WeeklyRevenueAttributes {
        WeeklyRevenueAttributes {
            week: self.week.format("%Y-%m-%d").to_string(),
            revenue: self.revenue,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MerchantItemCountAttributes {
    pub name: String,
    pub count: i64,
}

impl JsonApiResource for MerchantItemCount {
    const RESOURCE_TYPE: &'static str = "merchant_item_count";
    type Attributes = MerchantItemCountAttributes;

    fn resource_id(&self) -> Option<String> {
        Some(self.merchant.id.to_string())
    }

    fn attributes(&self) -> MerchantItemCountAttributes {
        MerchantItemCountAttributes {
            name: self.merchant.name.clone(),
            count: self.count,
        }
    }
}
