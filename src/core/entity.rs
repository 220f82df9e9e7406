//! Domain records: merchants, items, invoices and invoice line items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::core::error::StoreError;

/// A seller owning a catalogue of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: i64,
    pub name: String,
}

/// A catalogue entry; always belongs to exactly one merchant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub merchant_id: i64,
}

/// Lifecycle flag of an invoice
///
/// `Packaged` is the unshipped state. Cancelled invoices never count towards
/// revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Shipped,
    Packaged,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Shipped => "shipped",
            InvoiceStatus::Packaged => "packaged",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Whether line items on an invoice with this status count as revenue
    pub fn counts_as_revenue(&self) -> bool {
        !matches!(self, InvoiceStatus::Cancelled)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shipped" => Ok(InvoiceStatus::Shipped),
            "packaged" => Ok(InvoiceStatus::Packaged),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(StoreError::Corrupt(format!("unknown invoice status '{}'", other))),
        }
    }
}

/// An order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

/// Join row between an invoice and an item, priced at the time of sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
}

impl InvoiceItem {
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Largest price a `NUMERIC(12, 2)` column holds
pub const MAX_UNIT_PRICE: f64 = 9_999_999_999.99;

/// Round a price to whole cents, the precision prices are stored at
pub fn round_to_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn within_price_limit(value: f64) -> Result<(), ValidationError> {
    if value > MAX_UNIT_PRICE {
        return Err(ValidationError::new("too_large"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write payloads
// ---------------------------------------------------------------------------

/// Body of `POST /items`
///
/// Fields are optional at the serde level so that a missing field surfaces
/// as a validation message instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ItemPayload {
    #[validate(
        required(message = "name can't be blank"),
        custom(function = "not_blank", message = "name can't be blank")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "description can't be blank"),
        custom(function = "not_blank", message = "description can't be blank")
    )]
    pub description: Option<String>,

    #[validate(
        required(message = "unit_price can't be blank"),
        range(min = 0.0, message = "unit_price must be greater than or equal to 0"),
        custom(function = "within_price_limit", message = "unit_price must be less than or equal to 9999999999.99")
    )]
    pub unit_price: Option<f64>,

    #[validate(required(message = "merchant_id can't be blank"))]
    pub merchant_id: Option<i64>,
}

/// A validated item ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub merchant_id: i64,
}

impl NewItem {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        unit_price: f64,
        merchant_id: i64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            unit_price: round_to_cents(unit_price),
            merchant_id,
        }
    }
}

/// Body of `PATCH /items/:id`; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct ItemChanges {
    #[validate(custom(function = "not_blank", message = "name can't be blank"))]
    pub name: Option<String>,

    #[validate(custom(function = "not_blank", message = "description can't be blank"))]
    pub description: Option<String>,

    #[validate(
        range(min = 0.0, message = "unit_price must be greater than or equal to 0"),
        custom(function = "within_price_limit", message = "unit_price must be less than or equal to 9999999999.99")
    )]
    pub unit_price: Option<f64>,

    pub merchant_id: Option<i64>,
}

impl ItemChanges {
    /// Apply the present fields onto an existing item
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(unit_price) = self.unit_price {
            item.unit_price = round_to_cents(unit_price);
        }
        if let Some(merchant_id) = self.merchant_id {
            item.merchant_id = merchant_id;
        }
    }
}

/// Invoice to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

/// Invoice line to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoiceItem {
    pub invoice_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
}
