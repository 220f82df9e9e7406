//! JSON:API response envelope
//!
//! Records are exposed as `{ "id": "<string>", "type": "<name>", "attributes": {...} }`
//! and wrapped in a top-level `data` member, either as a single object or as
//! an array.

use serde::Serialize;

use crate::core::entity::{Item, Merchant};

/// Trait implemented by everything that can be rendered as a JSON:API resource
pub trait JsonApiResource {
    /// The `type` member (e.g. "item")
    const RESOURCE_TYPE: &'static str;

    /// Serializable attribute set
    type Attributes: Serialize;

    /// The `id` member; `None` for aggregates without an identity
    fn resource_id(&self) -> Option<String>;

    /// Build the attribute set
    fn attributes(&self) -> Self::Attributes;

    fn to_resource(&self) -> Resource<Self::Attributes> {
        Resource {
            id: self.resource_id(),
            resource_type: Self::RESOURCE_TYPE,
            attributes: self.attributes(),
        }
    }
}

/// A single resource object
#[derive(Debug, Clone, Serialize)]
pub struct Resource<A> {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: &'static str,
    pub attributes: A,
}

/// Top-level document
#[derive(Debug, Clone, Serialize)]
pub struct Document<D> {
    pub data: D,
}

impl<A> Document<Resource<A>> {
    /// `{ "data": { ... } }`
    pub fn single<T>(record: &T) -> Self
    where
        T: JsonApiResource<Attributes = A>,
    {
        Document {
            data: record.to_resource(),
        }
    }
}

impl<A> Document<Vec<Resource<A>>> {
    /// `{ "data": [ ... ] }`, an array even for zero or one record
    pub fn collection<'a, T>(records: impl IntoIterator<Item = &'a T>) -> Self
    where
        T: JsonApiResource<Attributes = A> + 'a,
    {
        Document {
            data: records.into_iter().map(|r| r.to_resource()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalogue resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MerchantAttributes {
    pub name: String,
}

impl JsonApiResource for Merchant {
    const RESOURCE_TYPE: &'static str = "merchant";
    type Attributes = MerchantAttributes;

    fn resource_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }

    fn attributes(&self) -> MerchantAttributes {
        MerchantAttributes {
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemAttributes {
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub merchant_id: i64,
}

impl JsonApiResource for Item {
    const RESOURCE_TYPE: &'static str = "item";
    type Attributes = ItemAttributes;

    fn resource_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }

    fn attributes(&self) -> ItemAttributes {
        ItemAttributes {
            name: self.name.clone(),
            description: self.description.clone(),
            unit_price: self.unit_price,
            merchant_id: self.merchant_id,
        }
    }
}
