//! # Buyer Sessions
//!
//! One cart per buyer, each behind its own lock.
//!
//! ## Thread Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SessionRegistry                                                        │
//! │  RwLock<HashMap<buyer_id, Arc<CartSession>>>                           │
//! │       │                                                                 │
//! │       ├── "buyer-1" ──► CartSession { Arc<Mutex<CartState>> }          │
//! │       └── "buyer-2" ──► CartSession { Arc<Mutex<CartState>> }          │
//! │                                                                         │
//! │  • The registry lock is held only to look up or insert a session       │
//! │  • A session lock is held for a whole command, across the history      │
//! │    lookup, so one buyer's commands apply one at a time, in the order   │
//! │    they were issued (tokio's Mutex queues waiters FIFO)                │
//! │  • Buyers never wait on each other                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::info;

use farmcart_core::CartState;

/// The cart of a single buyer.
#[derive(Debug)]
pub struct CartSession {
    buyer_id: String,
    cart: Arc<Mutex<CartState>>,
}

impl CartSession {
    pub fn new(buyer_id: impl Into<String>) -> Self {
        CartSession {
            buyer_id: buyer_id.into(),
            cart: Arc::new(Mutex::new(CartState::new())),
        }
    }

    pub fn buyer_id(&self) -> &str {
        &self.buyer_id
    }

    /// Locks the cart for the duration of one command.
    pub async fn lock(&self) -> MutexGuard<'_, CartState> {
        self.cart.lock().await
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let count = session.with_cart(|cart| cart.item_count()).await;
    /// ```
    pub async fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CartState) -> R,
    {
        let cart = self.cart.lock().await;
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    pub async fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CartState) -> R,
    {
        let mut cart = self.cart.lock().await;
        f(&mut cart)
    }
}

/// All live buyer sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<CartSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the buyer's session, starting an empty cart on first use.
    pub async fn get_or_create(&self, buyer_id: &str) -> Arc<CartSession> {
        if let Some(session) = self.sessions.read().await.get(buyer_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        // Another caller may have inserted it between the two locks
        let session = sessions
            .entry(buyer_id.to_string())
            .or_insert_with(|| {
                info!(buyer_id, "Cart session started");
                Arc::new(CartSession::new(buyer_id))
            });
        Arc::clone(session)
    }

    pub async fn get(&self, buyer_id: &str) -> Option<Arc<CartSession>> {
        self.sessions.read().await.get(buyer_id).cloned()
    }

    /// Drops the buyer's cart. Commands already holding the session finish
    /// against the detached cart. Returns whether a session existed.
    pub async fn end_session(&self, buyer_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(buyer_id).is_some();
        if removed {
            info!(buyer_id, "Cart session ended");
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
