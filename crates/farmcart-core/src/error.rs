//! # Error Types
//!
//! Domain-specific error types for farmcart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  farmcart-core errors (this file)                                      │
//! │  ├── CartError        - Rejected cart mutations                        │
//! │  └── ValidationError  - Malformed catalog input                        │
//! │                                                                         │
//! │  farmcart-db errors (separate crate)                                   │
//! │  └── DbError          - Order history storage failures                 │
//! │                                                                         │
//! │  farmcart-session errors                                               │
//! │  ├── HistoryError     - Swallowed (fail-open), only logged             │
//! │  └── ApiError         - What the UI sees (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CartError → ApiError → UI                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `Display` text of every [`CartError`] is exactly what ends up in
//! `CartState::error`, so the messages here are user-facing.

use thiserror::Error;

// =============================================================================
// Cart Error
// =============================================================================

/// A rejected cart mutation.
///
/// None of these are fatal: the cart is left untouched apart from its
/// `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Product belongs to a different seller than the items already in cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: 2 items from "Green Acres"
    ///      │
    ///      ▼
    /// Add "Onion" sold by "Sunny Farm"
    ///      │
    ///      ▼
    /// CrossSeller { seller_name: "Green Acres" }
    ///      │
    ///      ▼
    /// UI offers "Clear cart"
    /// ```
    #[error("Items in cart are from {seller_name}. Please clear your cart to add items from a different seller.")]
    CrossSeller { seller_name: String },

    /// A free item of the same fairness category is already in the cart.
    #[error("You already have a free item \"{item_name}\" in your cart. Only one free {category} item is allowed per order.")]
    DuplicateFreeItem { item_name: String, category: String },

    /// A free item of the same fairness category was received in a past order.
    #[error("You already received a free item \"{item_name}\" in order {order_id}. Only one free {category} item is allowed per buyer.")]
    DuplicateFreeItemInHistory {
        order_id: String,
        item_name: String,
        category: String,
    },

    /// Requested (or cumulative) quantity is more than the seller has on hand.
    #[error("Maximum {available} {unit} available for this item.")]
    QuantityExceedsAvailable { available: i64, unit: String },

    /// The line total or cart total would not fit in a `Money`.
    #[error("Cart total is too large. Please reduce the quantity.")]
    TotalTooLarge,

    /// Cart has exceeded maximum allowed line items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Product record failed boundary validation.
    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ValidationError),

    /// Requested quantity is not a usable number.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(ValidationError),
}

impl CartError {
    /// Returns true for the two free-item fairness rejections.
    pub fn is_fairness_violation(&self) -> bool {
        matches!(
            self,
            CartError::DuplicateFreeItem { .. } | CartError::DuplicateFreeItemInHistory { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised when a catalog record or request parameter does not have the
/// shape the cart needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., a price with three decimals).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CartError.
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================
