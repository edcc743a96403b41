//! # Cart
//!
//! The buyer's in-progress, single-seller cart, modelled as a reducer.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  CartAction               Checks                    State Change        │
//! │  ──────────               ──────                    ────────────        │
//! │                                                                         │
//! │  AddItem ──────────► product shape, quantity  ──► push / increment     │
//! │                      seller lock-in                current_seller set  │
//! │                      free item (check_cart)                            │
//! │                      available quantity                                │
//! │                                                                         │
//! │  UpdateQuantity ───► quantity, available ────────► items[i].qty = n    │
//! │                                                                         │
//! │  RemoveItem ───────► (none) ─────────────────────► items.remove(i)     │
//! │                                                    empty → reset       │
//! │                                                                         │
//! │  ClearCart ────────► (none) ─────────────────────► reset               │
//! │                                                                         │
//! │  ClearError ───────► (none) ─────────────────────► error = None        │
//! │                                                                         │
//! │  Every rejection leaves items/total/seller untouched and stores the    │
//! │  message in `error`.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `CartState` is a plain value. Callers that share it across tasks wrap it
//! in a lock (see `farmcart-session`).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CartError, CartResult};
use crate::fairness::check_cart;
use crate::money::Money;
use crate::types::{Product, Seller};
use crate::validation;
use crate::MAX_CART_ITEMS;

// =============================================================================
// Line Item
// =============================================================================

/// One product line in the cart.
///
/// Name, price and unit are frozen when the line is created; adding the same
/// product again only bumps the quantity and refreshes
/// `available_quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    pub available_quantity: i64,
    pub unit: String,
    /// `price * quantity`
    pub total: Money,
    pub owner_id: String,
}

impl CartLineItem {
    /// Creates a line from a product and quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLineItem {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
            available_quantity: product.available_quantity,
            unit: product.unit.clone(),
            total: product.price.multiply_quantity(quantity),
            owner_id: product.owner.id.clone(),
        }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }

    fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.total = self.price.multiply_quantity(quantity);
    }
}

// =============================================================================
// Actions
// =============================================================================

/// A discrete cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    AddItem { product: Product, quantity: i64 },
    UpdateQuantity { id: String, quantity: i64 },
    RemoveItem { id: String },
    ClearCart,
    ClearError,
}

// =============================================================================
// Checkout Draft
// =============================================================================

/// What the checkout service reads to build an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub seller: Seller,
    pub items: Vec<CartLineItem>,
    pub total: Money,
}

// =============================================================================
// Cart State
// =============================================================================

/// The cart of one buyer session.
///
/// ## Invariants
/// - Items are unique by `id`
/// - Every item's `owner_id` equals `current_seller.id`
/// - `current_seller` is `None` exactly when `items` is empty
/// - `1 <= quantity <= available_quantity` for every item
/// - `total` is the sum of item totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    items: Vec<CartLineItem>,
    total: Money,
    current_seller: Option<Seller>,
    error: Option<String>,
}

impl CartState {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        CartState::default()
    }

    /// Applies an action.
    ///
    /// On rejection the error message is stored in `error` and the rest of
    /// the state is untouched.
    pub fn apply(&mut self, action: CartAction) -> CartResult<()> {
        let result = match action {
            CartAction::AddItem { product, quantity } => self.reduce_add(&product, quantity),
            CartAction::UpdateQuantity { id, quantity } => self.reduce_update(&id, quantity),
            CartAction::RemoveItem { id } => {
                self.reduce_remove(&id);
                Ok(())
            }
            CartAction::ClearCart => {
                *self = CartState::new();
                Ok(())
            }
            CartAction::ClearError => {
                self.error = None;
                Ok(())
            }
        };

        if let Err(err) = &result {
            self.record_error(err);
        }
        result
    }

    /// Adds `quantity` of `product`, or increments an existing line.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CartResult<()> {
        self.apply(CartAction::AddItem {
            product: product.clone(),
            quantity,
        })
    }

    /// Sets the quantity of an existing line. Unknown ids are ignored.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> CartResult<()> {
        self.apply(CartAction::UpdateQuantity {
            id: id.to_string(),
            quantity,
        })
    }

    /// Removes a line. Removing the last line resets the cart.
    pub fn remove_item(&mut self, id: &str) {
        // Removal cannot be rejected
        let _ = self.apply(CartAction::RemoveItem { id: id.to_string() });
    }

    /// Resets to the initial empty state.
    pub fn clear_cart(&mut self) {
        let _ = self.apply(CartAction::ClearCart);
    }

    pub fn clear_error(&mut self) {
        let _ = self.apply(CartAction::ClearError);
    }

    /// Stores a rejection raised outside the reducer (the order history
    /// check) so the UI sees it like any other cart error.
    pub fn record_error(&mut self, err: &CartError) {
        self.error = Some(err.to_string());
    }

    /// Runs every check `AddItem` would, without mutating anything.
    ///
    /// ## Check Order
    /// 1. Product shape → `InvalidProduct`
    /// 2. Quantity → `InvalidQuantity`
    /// 3. Seller lock-in → `CrossSeller`
    /// 4. Free item already in cart → `DuplicateFreeItem`
    /// 5. Cumulative quantity vs stock → `QuantityExceedsAvailable`
    /// 6. Line and cart totals fit in `Money` → `TotalTooLarge`
    /// 7. Line count → `CartTooLarge`
    pub fn validate_add(&self, product: &Product, quantity: i64) -> CartResult<()> {
        validation::validate_product(product)?;
        validation::validate_quantity(quantity).map_err(CartError::InvalidQuantity)?;

        if let Some(seller) = &self.current_seller {
            if seller.id != product.owner.id {
                return Err(CartError::CrossSeller {
                    seller_name: seller.name.clone(),
                });
            }
        }

        if product.is_free() {
            if let Some(err) = check_cart(&self.items, &product.name).to_error(&product.name) {
                return Err(err);
            }
        }

        let existing = self.get(&product.id);
        let requested = existing
            .map_or(0, |item| item.quantity)
            .checked_add(quantity)
            .filter(|requested| *requested <= product.available_quantity)
            .ok_or_else(|| CartError::QuantityExceedsAvailable {
                available: product.available_quantity,
                unit: product.unit.clone(),
            })?;

        self.total_with_line(&product.id, product.price, requested)?;

        if existing.is_none() && !validation::has_room_for_line(self.items.len()) {
            return Err(CartError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        Ok(())
    }

    fn reduce_add(&mut self, product: &Product, quantity: i64) -> CartResult<()> {
        self.validate_add(product, quantity)?;

        match self.items.iter_mut().find(|item| item.id == product.id) {
            Some(item) => {
                item.available_quantity = product.available_quantity;
                item.set_quantity(item.quantity + quantity);
            }
            None => {
                if self.items.is_empty() {
                    self.current_seller = Some(product.owner.clone());
                }
                self.items.push(CartLineItem::from_product(product, quantity));
            }
        }

        self.recompute_total();
        self.error = None;
        Ok(())
    }

    fn reduce_update(&mut self, id: &str, quantity: i64) -> CartResult<()> {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return Ok(());
        };

        validation::validate_quantity(quantity).map_err(CartError::InvalidQuantity)?;
        let item = &self.items[index];
        if quantity > item.available_quantity {
            return Err(CartError::QuantityExceedsAvailable {
                available: item.available_quantity,
                unit: item.unit.clone(),
            });
        }
        self.total_with_line(id, item.price, quantity)?;

        self.items[index].set_quantity(quantity);
        self.recompute_total();
        Ok(())
    }

    /// Cart total if line `id` had `quantity` units at `price`, every other
    /// line unchanged. Fails with `TotalTooLarge` on overflow.
    fn total_with_line(&self, id: &str, price: Money, quantity: i64) -> CartResult<Money> {
        let line_total = price
            .checked_mul_quantity(quantity)
            .ok_or(CartError::TotalTooLarge)?;

        self.items
            .iter()
            .filter(|item| item.id != id)
            .try_fold(line_total, |acc, item| acc.checked_add(item.total))
            .ok_or(CartError::TotalTooLarge)
    }

    fn reduce_remove(&mut self, id: &str) {
        self.items.retain(|item| item.id != id);

        if self.items.is_empty() {
            *self = CartState::new();
        } else {
            self.recompute_total();
        }
    }

    fn recompute_total(&mut self) {
        self.total = self.items.iter().map(|item| item.total).sum();
    }

    // =========================================================================
    // Read side
    // =========================================================================

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn current_seller(&self) -> Option<&Seller> {
        self.current_seller.as_ref()
    }

    /// Last rejection message, if the UI has not cleared it yet.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities over all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn free_items(&self) -> impl Iterator<Item = &CartLineItem> {
        self.items.iter().filter(|item| item.is_free())
    }

    /// Snapshot handed to checkout. `None` for an empty cart.
    pub fn checkout_draft(&self) -> Option<OrderDraft> {
        let seller = self.current_seller.clone()?;
        Some(OrderDraft {
            seller,
            items: self.items.clone(),
            total: self.total,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
