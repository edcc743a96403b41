//! # Validation Module
//!
//! Boundary checks for catalog input before it reaches the cart reducer.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI                                                           │
//! │  ├── Quantity steppers bounded by available stock                      │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: ProductRecord → Product (types.rs)                           │
//! │  └── Missing fields become InvalidProduct                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                  │
//! │  ├── Field shape (ids, names, prices, stock)                           │
//! │  └── Requested quantity                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: CartState business rules (seller lock, free items, stock)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Product;
use crate::MAX_CART_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest product name the cart accepts.
const MAX_NAME_LEN: usize = 200;

// =============================================================================
// Product Validators
// =============================================================================

/// Validates every field of a product the cart relies on.
///
/// ## Rules
/// - `id`, `name`, `unit`, `owner.id`, `owner.name` must not be blank
/// - `name` at most 200 characters
/// - `price` must not be negative (zero is a free item)
/// - `available_quantity` must not be negative
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    require("id", &product.id)?;
    validate_product_name(&product.name)?;
    require("unit", &product.unit)?;
    require("owner.id", &product.owner.id)?;
    require("owner.name", &product.owner.name)?;
    validate_price(product.price)?;

    if product.available_quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "availableQuantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use farmcart_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Marigold Sapling").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    require("name", name)?;

    if name.trim().chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Example
/// ```rust
/// use farmcart_core::money::Money;
/// use farmcart_core::validation::validate_price;
///
/// assert!(validate_price(Money::from_rupees(20)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());        // Free item
/// assert!(validate_price(Money::from_paise(-1)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a requested quantity.
///
/// Must be positive. Stock limits are a separate, cart-level rule
/// (`CartError::QuantityExceedsAvailable`).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Returns true when one more distinct line would still fit in the cart.
pub fn has_room_for_line(current_items: usize) -> bool {
    current_items < MAX_CART_ITEMS
}

fn require(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Seller;

    fn product() -> Product {
        Product::new("a", "Tomato", Money::from_rupees(20), Seller::new("s1", "Green Acres"), 5)
    }

    #[test]
    fn test_valid_product() {
        assert!(validate_product(&product()).is_ok());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut p = product();
        p.id = " ".to_string();
        assert_eq!(
            validate_product(&p),
            Err(ValidationError::Required { field: "id".to_string() })
        );

        let mut p = product();
        p.owner.name = String::new();
        assert_eq!(
            validate_product(&p),
            Err(ValidationError::Required { field: "owner.name".to_string() })
        );

        let mut p = product();
        p.unit = String::new();
        assert!(validate_product(&p).is_err());
    }

    #[test]
    fn test_negative_price_and_stock_rejected() {
        let mut p = product();
        p.price = Money::from_paise(-100);
        assert!(validate_product(&p).is_err());

        let mut p = product();
        p.available_quantity = -1;
        assert!(validate_product(&p).is_err());
    }

    #[test]
    fn test_long_name_rejected() {
        assert!(validate_product_name(&"A".repeat(201)).is_err());
        assert!(validate_product_name(&"A".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(i64::MAX).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_cart_room() {
        assert!(has_room_for_line(0));
        assert!(has_room_for_line(MAX_CART_ITEMS - 1));
        assert!(!has_room_for_line(MAX_CART_ITEMS));
    }
}
