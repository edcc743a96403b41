//! # Order History Check
//!
//! The second half of the free-item rule: a buyer who already received a
//! free item of some kind in a past order cannot get another one.
//!
//! ## Fail-Open Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HistoryGuard::check_order_history(buyer, "Mango Sapling")              │
//! │       │                                                                 │
//! │       ├── disabled ─────────────────────────────► no conflict          │
//! │       ▼                                                                 │
//! │  timeout(source.orders_for_buyer(buyer))                               │
//! │       │                                                                 │
//! │       ├── Ok(orders) ──► scan_order_history ────► conflict / none      │
//! │       ├── Err(e)     ──► warn! ─────────────────► no conflict          │
//! │       └── elapsed    ──► warn! ─────────────────► no conflict          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A history outage must never stop a buyer from shopping, so failures are
//! logged and the add goes ahead.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::CartConfig;
use farmcart_core::fairness::scan_order_history;
use farmcart_core::{FreeItemConflict, PastOrder};
use farmcart_db::{Database, DbError, OrderRepository};

// =============================================================================
// Source
// =============================================================================

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Order history unavailable: {0}")]
    Unavailable(String),

    #[error("Order history query failed: {0}")]
    Database(#[from] DbError),
}

/// Where a buyer's past orders come from.
#[async_trait]
pub trait OrderHistorySource: Send + Sync {
    /// All orders of `buyer_id`, in any status.
    async fn orders_for_buyer(&self, buyer_id: &str) -> Result<Vec<PastOrder>, HistoryError>;
}

#[async_trait]
impl OrderHistorySource for OrderRepository {
    async fn orders_for_buyer(&self, buyer_id: &str) -> Result<Vec<PastOrder>, HistoryError> {
        Ok(self.list_for_buyer(buyer_id).await?)
    }
}

#[async_trait]
impl OrderHistorySource for Database {
    async fn orders_for_buyer(&self, buyer_id: &str) -> Result<Vec<PastOrder>, HistoryError> {
        Ok(self.orders().list_for_buyer(buyer_id).await?)
    }
}

/// Order history kept in memory, keyed by buyer. For development and tests.
#[derive(Debug, Default)]
pub struct InMemoryOrderHistory {
    orders: RwLock<HashMap<String, Vec<PastOrder>>>,
}

impl InMemoryOrderHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: impl IntoIterator<Item = PastOrder>) -> Self {
        let mut by_buyer: HashMap<String, Vec<PastOrder>> = HashMap::new();
        for order in orders {
            by_buyer.entry(order.buyer_id.clone()).or_default().push(order);
        }
        InMemoryOrderHistory {
            orders: RwLock::new(by_buyer),
        }
    }

    pub async fn record(&self, order: PastOrder) {
        self.orders
            .write()
            .await
            .entry(order.buyer_id.clone())
            .or_default()
            .push(order);
    }
}

#[async_trait]
impl OrderHistorySource for InMemoryOrderHistory {
    async fn orders_for_buyer(&self, buyer_id: &str) -> Result<Vec<PastOrder>, HistoryError> {
        Ok(self
            .orders
            .read()
            .await
            .get(buyer_id)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Guard
// =============================================================================

/// Checks a buyer's past orders before a free item goes into their cart.
#[derive(Clone)]
pub struct HistoryGuard {
    source: Arc<dyn OrderHistorySource>,
    timeout: Duration,
    enabled: bool,
}

impl std::fmt::Debug for HistoryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryGuard")
            .field("timeout", &self.timeout)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl HistoryGuard {
    pub fn new(source: Arc<dyn OrderHistorySource>, timeout: Duration) -> Self {
        HistoryGuard {
            source,
            timeout,
            enabled: true,
        }
    }

    pub fn from_config(source: Arc<dyn OrderHistorySource>, config: &CartConfig) -> Self {
        HistoryGuard::new(source, config.history_check_timeout())
            .enabled(config.history_check_enabled)
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Looks for a free item similar to `item_name` in the buyer's orders.
    ///
    /// Never fails: a lookup error or timeout is logged and reported as no
    /// conflict.
    pub async fn check_order_history(&self, buyer_id: &str, item_name: &str) -> FreeItemConflict {
        if !self.enabled {
            return FreeItemConflict::none();
        }

        match tokio::time::timeout(self.timeout, self.source.orders_for_buyer(buyer_id)).await {
            Ok(Ok(orders)) => {
                let conflict = scan_order_history(&orders, item_name);
                debug!(
                    buyer_id,
                    item_name,
                    orders = orders.len(),
                    conflict = conflict.has_conflict,
                    "Order history checked"
                );
                conflict
            }
            Ok(Err(err)) => {
                warn!(buyer_id, item_name, error = %err, "Order history lookup failed, allowing free item");
                FreeItemConflict::none()
            }
            Err(_) => {
                warn!(
                    buyer_id,
                    item_name,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Order history lookup timed out, allowing free item"
                );
                FreeItemConflict::none()
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
