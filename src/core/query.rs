//! Query parameters and pagination utilities
//!
//! Query strings are deserialized into raw string fields first and parsed
//! here, so that a malformed value produces the API's own error envelope
//! instead of the framework's plain-text rejection.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Deserialize;

use crate::core::error::ApiError;

/// Default number of records per page
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Default size of ranked revenue lists
pub const DEFAULT_REVENUE_QUANTITY: i64 = 10;

/// Default size of the most-items merchant list
pub const DEFAULT_MOST_ITEMS_QUANTITY: i64 = 5;

/// Query parameters for pagination
///
/// # Example
/// ```rust,ignore
/// // In handler:
/// pub async fn list_items(Query(params): Query<PageParams>) -> ApiResult<...> {
///     let page = params.pagination()?;
/// }
///
/// // Usage:
/// GET /items?page=2&per_page=10
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    /// Page number (starts at 1, anything lower is treated as 1)
    pub page: Option<String>,

    /// Number of records per page (must not be negative)
    pub per_page: Option<String>,
}

impl PageParams {
    /// Validate the raw parameters into a [`Pagination`] window
    pub fn pagination(&self) -> Result<Pagination, ApiError> {
        let page = parse_integer("page", self.page.as_deref())?.unwrap_or(1);
        let per_page = parse_integer("per_page", self.per_page.as_deref())?
            .unwrap_or(DEFAULT_PER_PAGE);

        if per_page < 0 {
            return Err(ApiError::InvalidParameter(
                "per_page must not be negative".to_string(),
            ));
        }

        Ok(Pagination::new(page, per_page))
    }
}

/// A validated LIMIT/OFFSET window over a table in primary-key order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    per_page: i64,
}

impl Pagination {
    /// `page` values below 1 clamp to 1; `per_page` values below 0 clamp to 0
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(0),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Number of records skipped before this page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Slice an already ordered collection
    pub fn apply<T>(&self, records: impl IntoIterator<Item = T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        records.into_iter().skip(offset).take(limit).collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// `?quantity=` parameter of ranked endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuantityParams {
    pub quantity: Option<String>,
}

impl QuantityParams {
    /// Parse the quantity, falling back to `default`; must be a positive integer
    pub fn quantity_or(&self, default: i64) -> Result<i64, ApiError> {
        match parse_integer("quantity", self.quantity.as_deref())? {
            None => Ok(default),
            Some(q) if q > 0 => Ok(q),
            Some(_) => Err(ApiError::InvalidParameter(
                "quantity must be greater than 0".to_string(),
            )),
        }
    }
}

/// `?name=` parameter of `GET /merchants/find`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameParams {
    pub name: Option<String>,
}

impl NameParams {
    pub fn required_name(&self) -> Result<&str, ApiError> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(ApiError::InvalidParameter(
                "name must be provided".to_string(),
            )),
        }
    }
}

/// Raw parameters of `GET /items/find_all`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindAllParams {
    pub name: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

/// Validated search criteria for items
#[derive(Debug, Clone, PartialEq)]
pub enum ItemFilter {
    /// Case-insensitive substring match on the name
    Name(String),
    /// Inclusive price range; at least one bound is set
    Price { min: Option<f64>, max: Option<f64> },
}

impl ItemFilter {
    pub fn matches(&self, name: &str, unit_price: f64) -> bool {
        match self {
            ItemFilter::Name(fragment) => name.to_lowercase().contains(&fragment.to_lowercase()),
            ItemFilter::Price { min, max } => {
                min.is_none_or(|min| unit_price >= min) && max.is_none_or(|max| unit_price <= max)
            }
        }
    }
}

impl FindAllParams {
    /// Name and price criteria are mutually exclusive; one of them is required
    pub fn filter(&self) -> Result<ItemFilter, ApiError> {
        let min = parse_price("min_price", self.min_price.as_deref())?;
        let max = parse_price("max_price", self.max_price.as_deref())?;
        let has_price = min.is_some() || max.is_some();

        match (self.name.as_deref(), has_price) {
            (Some(_), true) => Err(ApiError::InvalidParameter(
                "cannot search by name and price at the same time".to_string(),
            )),
            (Some(name), false) => {
                let name = name.trim();
                if name.is_empty() {
                    Err(ApiError::InvalidParameter("name must not be empty".to_string()))
                } else {
                    Ok(ItemFilter::Name(name.to_string()))
                }
            }
            (None, true) => {
                match (min, max) {
                    (Some(min), Some(max)) if min > max => Err(ApiError::InvalidParameter(
                        "min_price must not exceed max_price".to_string(),
                    )),
                    _ => Ok(ItemFilter::Price { min, max }),
                }
            }
            (None, false) => Err(ApiError::InvalidParameter(
                "name or a price range must be provided".to_string(),
            )),
        }
    }
}

/// Raw `?start=&end=` parameters of `GET /revenue`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRangeParams {
    pub fn range(&self) -> Result<DateRange, ApiError> {
        let start = parse_date("start", self.start.as_deref())?;
        let end = parse_date("end", self.end.as_deref())?;

        match (start, end) {
            (Some(start), Some(end)) if start > end => Err(ApiError::InvalidParameter(
                "start must not be after end".to_string(),
            )),
            _ => Ok(DateRange { start, end }),
        }
    }
}

/// Inclusive calendar-day range on invoice creation time (UTC)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// First instant included in the range
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        self.start
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// First instant after the range
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        self.end
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.lower_bound().is_none_or(|lo| at >= lo) && self.upper_bound().is_none_or(|hi| at < hi)
    }
}

fn parse_integer(field: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<i64>().map(Some).map_err(|_| {
            ApiError::InvalidParameter(format!("{} must be an integer", field))
        }),
    }
}

fn parse_price(field: &str, raw: Option<&str>) -> Result<Option<f64>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => match value.parse::<f64>() {
            Ok(price) if price.is_finite() && price >= 0.0 => Ok(Some(price)),
            Ok(_) => Err(ApiError::InvalidParameter(format!(
                "{} must not be negative",
                field
            ))),
            Err(_) => Err(ApiError::InvalidParameter(format!(
                "{} must be a number",
                field
            ))),
        },
    }
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::InvalidParameter(format!("{} must be a YYYY-MM-DD date", field))),
    }
}
