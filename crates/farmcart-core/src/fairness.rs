//! # Free-Item Fairness
//!
//! "At most one free item per product category": the pure half of the free
//! item guard. The async half, which fetches order history, lives in
//! `farmcart-session`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Free Item Guard                                    │
//! │                                                                         │
//! │  check_cart(items, name)          scan_order_history(orders, name)     │
//! │  ───────────────────────          ────────────────────────────────     │
//! │  • always enforced                • best-effort (fail-open upstream)   │
//! │  • synchronous, no I/O            • pure scan over fetched orders      │
//! │  • free cart lines only           • free lines of counted orders only  │
//! │                                                                         │
//! │              both decide "same category" with similarity::similar      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartLineItem;
use crate::error::CartError;
use crate::similarity::{fairness_category, similar};
use crate::types::{OrderStatus, PastOrder};

/// The historical order entry that blocks a free item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingOrder {
    pub order_id: String,
    pub item_name: String,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

/// Outcome of a free-item check. Transient, never stored in the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FreeItemConflict {
    pub has_conflict: bool,
    pub conflicting_item: Option<CartLineItem>,
    pub conflicting_order: Option<ConflictingOrder>,
}

impl FreeItemConflict {
    /// No conflict. Also what a failed history lookup degrades to.
    pub fn none() -> Self {
        FreeItemConflict::default()
    }

    fn in_cart(item: &CartLineItem) -> Self {
        FreeItemConflict {
            has_conflict: true,
            conflicting_item: Some(item.clone()),
            conflicting_order: None,
        }
    }

    fn in_history(order: ConflictingOrder) -> Self {
        FreeItemConflict {
            has_conflict: true,
            conflicting_item: None,
            conflicting_order: Some(order),
        }
    }

    /// Converts a conflict into the error that rejects adding `new_item_name`.
    ///
    /// Returns `None` when there is no conflict.
    pub fn to_error(&self, new_item_name: &str) -> Option<CartError> {
        if !self.has_conflict {
            return None;
        }
        let category = fairness_category(new_item_name);

        if let Some(item) = &self.conflicting_item {
            return Some(CartError::DuplicateFreeItem {
                item_name: item.name.clone(),
                category,
            });
        }

        self.conflicting_order
            .as_ref()
            .map(|order| CartError::DuplicateFreeItemInHistory {
                order_id: order.order_id.clone(),
                item_name: order.item_name.clone(),
                category,
            })
    }
}

/// Looks for a free cart line in the same category as `new_item_name`.
///
/// ## Example
/// ```rust
/// use farmcart_core::fairness::check_cart;
/// use farmcart_core::{CartState, Money, Product, Seller};
///
/// let seller = Seller::new("s1", "Green Acres");
/// let mut cart = CartState::new();
/// cart.add_item(&Product::new("m1", "Marigold Sapling", Money::zero(), seller, 10), 1).unwrap();
///
/// assert!(check_cart(cart.items(), "Marigold Seeds").has_conflict);
/// assert!(!check_cart(cart.items(), "Tulsi").has_conflict);
/// ```
pub fn check_cart(items: &[CartLineItem], new_item_name: &str) -> FreeItemConflict {
    items
        .iter()
        .find(|item| item.is_free() && similar(&item.name, new_item_name))
        .map(FreeItemConflict::in_cart)
        .unwrap_or_default()
}

/// Looks through past orders for a free line in the same category as
/// `item_name`.
///
/// Orders that never went through (cancelled, rejected) are skipped. The
/// first match in the given order wins.
pub fn scan_order_history(orders: &[PastOrder], item_name: &str) -> FreeItemConflict {
    for order in orders.iter().filter(|o| o.status.counts_toward_free_limit()) {
        if let Some(line) = order
            .items
            .iter()
            .find(|line| line.is_free() && similar(&line.name, item_name))
        {
            return FreeItemConflict::in_history(ConflictingOrder {
                order_id: order.id.clone(),
                item_name: line.name.clone(),
                order_date: order.created_at,
                status: order.status,
            });
        }
    }

    FreeItemConflict::none()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::PastOrderItem;

    fn line(id: &str, name: &str, price: Money) -> CartLineItem {
        CartLineItem {
            id: id.to_string(),
            name: name.to_string(),
            price,
            quantity: 1,
            available_quantity: 10,
            unit: "piece".to_string(),
            total: price,
            owner_id: "s1".to_string(),
        }
    }

    fn order(id: &str, status: OrderStatus, items: &[(&str, i64)]) -> PastOrder {
        PastOrder {
            id: id.to_string(),
            buyer_id: "b1".to_string(),
            seller_id: "s1".to_string(),
            status,
            created_at: Utc::now(),
            items: items
                .iter()
                .map(|(name, paise)| PastOrderItem {
                    name: name.to_string(),
                    price_per_unit: Money::from_paise(*paise),
                    quantity: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn test_cart_conflict_only_for_free_lines() {
        let items = vec![
            line("a", "Marigold Plant", Money::from_rupees(30)),
            line("b", "Tulsi Sapling", Money::zero()),
        ];

        // Paid marigold does not count
        assert!(!check_cart(&items, "Marigold Seeds").has_conflict);

        let conflict = check_cart(&items, "Tulsi Seeds");
        assert!(conflict.has_conflict);
        assert_eq!(conflict.conflicting_item.as_ref().unwrap().id, "b");
        assert!(conflict.conflicting_order.is_none());
    }

    #[test]
    fn test_cart_conflict_to_error() {
        let items = vec![line("m", "Marigold Sapling", Money::zero())];
        let err = check_cart(&items, "Marigold Seeds")
            .to_error("Marigold Seeds")
            .unwrap();
        assert_eq!(
            err,
            CartError::DuplicateFreeItem {
                item_name: "Marigold Sapling".to_string(),
                category: "marigold".to_string(),
            }
        );
    }

    #[test]
    fn test_no_conflict_to_error_is_none() {
        assert!(FreeItemConflict::none().to_error("Anything").is_none());
    }

    #[test]
    fn test_history_conflict() {
        let orders = vec![
            order("o1", OrderStatus::Completed, &[("Tomato", 2000)]),
            order("o2", OrderStatus::Completed, &[("Onion", 1500), ("Marigold Seeds", 0)]),
        ];

        let conflict = scan_order_history(&orders, "Marigold Sapling");
        assert!(conflict.has_conflict);
        let hit = conflict.conflicting_order.clone().unwrap();
        assert_eq!(hit.order_id, "o2");
        assert_eq!(hit.item_name, "Marigold Seeds");
        assert_eq!(hit.status, OrderStatus::Completed);

        let err = conflict.to_error("Marigold Sapling").unwrap();
        assert!(matches!(err, CartError::DuplicateFreeItemInHistory { .. }));
    }

    #[test]
    fn test_history_ignores_unfulfilled_orders() {
        let orders = vec![
            order("o1", OrderStatus::Cancelled, &[("Marigold Seeds", 0)]),
            order("o2", OrderStatus::Rejected, &[("Marigold Plant", 0)]),
        ];
        assert!(!scan_order_history(&orders, "Marigold Sapling").has_conflict);
    }

    #[test]
    fn test_history_ignores_paid_lines() {
        let orders = vec![order("o1", OrderStatus::Completed, &[("Marigold Seeds", 500)])];
        assert!(!scan_order_history(&orders, "Marigold Sapling").has_conflict);
    }
}
