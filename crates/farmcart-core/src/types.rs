//! # Domain Types
//!
//! Catalog and order-history types consumed by the cart.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Seller      │   │   PastOrder     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  name           │──►│  name           │   │  buyer_id       │       │
//! │  │  price (Money)  │   │  whatsapp       │   │  status         │       │
//! │  │  owner          │   │  location       │   │  items[]        │       │
//! │  │  available_qty  │   └─────────────────┘   └─────────────────┘       │
//! │  │  unit           │                                                    │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ProductRecord: untyped catalog JSON, converted with TryFrom           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CartError, ValidationError};
use crate::money::Money;
use crate::validation;
use crate::DEFAULT_UNIT;

// =============================================================================
// Seller
// =============================================================================

/// The seller who owns a product, and who the whole cart is locked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: String,
    pub name: String,
    /// WhatsApp contact number, shown so the buyer can reach the farm.
    pub whatsapp: Option<String>,
    pub location: Option<String>,
}

impl Seller {
    /// Creates a seller with no contact details.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Seller {
            id: id.into(),
            name: name.into(),
            whatsapp: None,
            location: None,
        }
    }

    pub fn with_whatsapp(mut self, whatsapp: impl Into<String>) -> Self {
        self.whatsapp = Some(whatsapp.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog listing as the cart sees it.
///
/// `available_quantity` is a snapshot taken when the buyer clicks "add";
/// the cart never re-reads stock on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub owner: Seller,
    pub available_quantity: i64,
    pub unit: String,
}

impl Product {
    /// Creates a product sold in the default unit (kg).
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        owner: Seller,
        available_quantity: i64,
    ) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            price,
            owner,
            available_quantity,
            unit: DEFAULT_UNIT.to_string(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// A zero-priced listing, subject to the one-per-category rule.
    #[inline]
    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }
}

// =============================================================================
// Catalog Record (untyped boundary)
// =============================================================================

/// Seller block of a raw catalog record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub whatsapp: Option<String>,
    pub location: Option<String>,
}

/// A product as it arrives from the catalog source.
///
/// Every field is optional here so that a missing field becomes an
/// [`CartError::InvalidProduct`] instead of a deserialization panic deep
/// inside the cart. `price` may be a JSON number or a decimal string.
///
/// ## Example
/// ```rust
/// use farmcart_core::{Product, ProductRecord};
///
/// let json = r#"{
///     "id": "a", "name": "Tomato", "price": 20,
///     "owner": {"id": "s1", "name": "Green Acres"},
///     "availableQuantity": 5
/// }"#;
/// let record: ProductRecord = serde_json::from_str(json).unwrap();
/// let product = Product::try_from(record).unwrap();
/// assert_eq!(product.unit, "kg");
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: Option<serde_json::Value>,
    pub owner: Option<OwnerRecord>,
    pub available_quantity: Option<i64>,
    pub unit: Option<String>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = CartError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        let price = match record.price {
            Some(serde_json::Value::Number(n)) => Money::parse_decimal(&n.to_string())?,
            Some(serde_json::Value::String(s)) => Money::parse_decimal(&s)?,
            Some(_) => {
                return Err(ValidationError::InvalidFormat {
                    field: "price".to_string(),
                    reason: "expected a number".to_string(),
                }
                .into())
            }
            None => return Err(ValidationError::required("price").into()),
        };

        let owner = record
            .owner
            .ok_or_else(|| ValidationError::required("owner"))?;

        let unit = record
            .unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string());

        let product = Product {
            id: record.id.unwrap_or_default(),
            name: record.name.unwrap_or_default(),
            price,
            owner: Seller {
                id: owner.id.unwrap_or_default(),
                name: owner.name.unwrap_or_default(),
                whatsapp: owner.whatsapp,
                location: owner.location,
            },
            available_quantity: record
                .available_quantity
                .ok_or_else(|| ValidationError::required("availableQuantity"))?,
            unit,
        };

        validation::validate_product(&product)?;
        Ok(product)
    }
}

// =============================================================================
// Order History
// =============================================================================

/// Status of a past order, as reported by the order history service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, waiting for the seller.
    Pending,
    /// Seller confirmed.
    Accepted,
    /// Handed over to the buyer.
    Completed,
    /// Withdrawn by the buyer.
    Cancelled,
    /// Declined by the seller.
    Rejected,
}

impl OrderStatus {
    /// Whether a free item in an order with this status used up the
    /// buyer's allowance. Orders that were never fulfilled do not.
    pub fn counts_toward_free_limit(&self) -> bool {
        !matches!(self, OrderStatus::Cancelled | OrderStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Rejected => "rejected",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line of a past order. Only `price_per_unit == 0` lines matter to the
/// fairness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PastOrderItem {
    pub name: String,
    pub price_per_unit: Money,
    pub quantity: i64,
}

impl PastOrderItem {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.price_per_unit.is_zero()
    }
}

/// A buyer's historical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PastOrder {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<PastOrderItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> ProductRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_record_converts_with_default_unit() {
        let product = Product::try_from(record(
            r#"{"id":"a","name":"Tomato","price":20.5,
                "owner":{"id":"s1","name":"Green Acres","whatsapp":"+911234"},
                "availableQuantity":5}"#,
        ))
        .unwrap();

        assert_eq!(product.price.paise(), 2050);
        assert_eq!(product.unit, "kg");
        assert_eq!(product.owner.whatsapp.as_deref(), Some("+911234"));
        assert!(!product.is_free());
    }

    #[test]
    fn test_record_accepts_string_price_and_unit() {
        let product = Product::try_from(record(
            r#"{"id":"m","name":"Marigold Sapling","price":"0",
                "owner":{"id":"s1","name":"Green Acres"},
                "availableQuantity":10,"unit":"piece"}"#,
        ))
        .unwrap();

        assert!(product.is_free());
        assert_eq!(product.unit, "piece");
    }

    #[test]
    fn test_record_missing_fields_is_invalid_product() {
        let err = Product::try_from(record(r#"{"id":"a","name":"Tomato","price":20}"#))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid product: owner is required");

        let err = Product::try_from(record(
            r#"{"id":"a","name":"Tomato","owner":{"id":"s1","name":"x"},"availableQuantity":1}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, CartError::InvalidProduct(_)));
    }

    #[test]
    fn test_record_blank_owner_id_is_invalid() {
        let err = Product::try_from(record(
            r#"{"id":"a","name":"Tomato","price":1,"owner":{"name":"x"},"availableQuantity":1}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, CartError::InvalidProduct(ValidationError::Required { .. })));
    }

    #[test]
    fn test_record_rejects_non_numeric_price() {
        let err = Product::try_from(record(
            r#"{"id":"a","name":"Tomato","price":true,
                "owner":{"id":"s1","name":"x"},"availableQuantity":1}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, CartError::InvalidProduct(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn test_order_status_allowance() {
        assert!(OrderStatus::Completed.counts_toward_free_limit());
        assert!(OrderStatus::Pending.counts_toward_free_limit());
        assert!(!OrderStatus::Cancelled.counts_toward_free_limit());
        assert!(!OrderStatus::Rejected.counts_toward_free_limit());
        assert_eq!(OrderStatus::Accepted.to_string(), "accepted");
    }
}
