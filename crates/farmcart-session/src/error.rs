//! # API Error Type
//!
//! Unified error type for cart commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in FarmCart                               │
//! │                                                                         │
//! │  CartService::add_to_cart                                              │
//! │         │                                                               │
//! │         ├── CartError::CrossSeller ──────────► CROSS_SELLER            │
//! │         ├── CartError::DuplicateFreeItem* ───► FREE_ITEM_LIMIT         │
//! │         ├── CartError::QuantityExceeds... ───► QUANTITY_EXCEEDED       │
//! │         ├── CartError::*TooLarge ────────────► CART_ERROR              │
//! │         ├── CartError::Invalid* ─────────────► VALIDATION_ERROR        │
//! │         └── DbError (startup, seeding) ──────► DATABASE_ERROR          │
//! │                                                                         │
//! │  History lookup failures never get here: the guard allows the add.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "code": "FREE_ITEM_LIMIT",
//!   "message": "You already have a free item \"Mango Sapling\" in your cart. ..."
//! }
//! ```

use serde::Serialize;

use crate::config::ConfigError;
use farmcart_core::CartError;
use farmcart_db::DbError;

/// API error returned from cart commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product sold by a different seller than the cart's
    CrossSeller,

    /// A free item of the same kind is already in the cart or was received before
    FreeItemLimit,

    /// Quantity beyond what the seller has
    QuantityExceeded,

    /// Other cart rule (line limit, total too large)
    CartError,

    /// Input validation failed
    ValidationError,

    /// Referenced record does not exist
    NotFound,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts cart rejections to API errors. The message is the same text the
/// cart stores in its `error` field.
impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        let code = match &err {
            CartError::CrossSeller { .. } => ErrorCode::CrossSeller,
            CartError::DuplicateFreeItem { .. } | CartError::DuplicateFreeItemInHistory { .. } => {
                ErrorCode::FreeItemLimit
            }
            CartError::QuantityExceedsAvailable { .. } => ErrorCode::QuantityExceeded,
            CartError::CartTooLarge { .. } | CartError::TotalTooLarge => ErrorCode::CartError,
            CartError::InvalidProduct(_) | CartError::InvalidQuantity(_) => {
                ErrorCode::ValidationError
            }
        };

        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::new(
                ErrorCode::NotFound,
                format!("{} not found: {}", entity, id),
            ),
            DbError::Duplicate { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Constraint(message) => {
                tracing::error!("Constraint violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::Connection(_) | DbError::Migration(_) | DbError::PoolTimeout => {
                ApiError::new(ErrorCode::DatabaseError, "Order history is unavailable")
            }
            // Log the actual error but return a generic message
            other => {
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_codes() {
        let cross = ApiError::from(CartError::CrossSeller {
            seller_name: "Green Acres".into(),
        });
        assert_eq!(cross.code, ErrorCode::CrossSeller);
        assert!(cross.message.contains("Green Acres"));

        let free = ApiError::from(CartError::DuplicateFreeItemInHistory {
            order_id: "o-1".into(),
            item_name: "Mango Sapling".into(),
            category: "mango".into(),
        });
        assert_eq!(free.code, ErrorCode::FreeItemLimit);

        let qty = ApiError::from(CartError::QuantityExceedsAvailable {
            available: 5,
            unit: "kg".into(),
        });
        assert_eq!(qty.code, ErrorCode::QuantityExceeded);
        assert_eq!(qty.message, "Maximum 5 kg available for this item.");
    }

    #[test]
    fn test_serializes_screaming_code() {
        let err = ApiError::new(ErrorCode::FreeItemLimit, "nope");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "FREE_ITEM_LIMIT");
        assert_eq!(json["message"], "nope");
    }

    #[test]
    fn test_db_errors_hide_details() {
        let err = ApiError::from(DbError::Query("near \"SELEC\": syntax error".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");

        let err = ApiError::from(DbError::not_found("Order", "o-9"));
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
