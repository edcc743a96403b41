//! # Cart Commands
//!
//! Every operation a UI performs on a buyer's cart.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────────┐     ┌──────────────┐                │
//! │  │  Empty   │────►│ Seller locked│────►│  Checkout    │                │
//! │  │  Cart    │     │  (items)     │     │  (draft)     │                │
//! │  └──────────┘     └──────────────┘     └──────────────┘                │
//! │       ▲                  │                                              │
//! │       │             add_to_cart                                         │
//! │       │             update_cart_item                                    │
//! │       │             remove_from_cart (last item resets)                 │
//! │       │                  │                                              │
//! │       └──── clear_cart ──┘                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejections are returned as [`ApiError`] and also kept in the cart's
//! `error` field until the next successful add or `clear_error`.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::CartConfig;
use crate::error::ApiError;
use crate::history::{HistoryGuard, OrderHistorySource};
use crate::session::SessionRegistry;
use farmcart_core::{
    CartError, CartLineItem, CartState, Money, OrderDraft, Product, ProductRecord, Seller,
};
use farmcart_db::{Database, DbConfig};

// =============================================================================
// Responses
// =============================================================================

/// Cart totals summary for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub free_item_count: usize,
    pub total: Money,
    /// `total` formatted for display, e.g. `₹55.00`
    pub total_display: String,
}

/// Cart response including items and totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartLineItem>,
    pub totals: CartTotals,
    pub current_seller: Option<Seller>,
    pub error: Option<String>,
}

impl CartResponse {
    fn from_state(cart: &CartState, config: &CartConfig) -> Self {
        CartResponse {
            items: cart.items().to_vec(),
            totals: CartTotals {
                item_count: cart.item_count(),
                total_quantity: cart.total_quantity(),
                free_item_count: cart.free_items().count(),
                total: cart.total(),
                total_display: config.format_currency(cart.total().paise()),
            },
            current_seller: cart.current_seller().cloned(),
            error: cart.error().map(str::to_string),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Cart commands for all buyers.
#[derive(Debug)]
pub struct CartService {
    config: CartConfig,
    sessions: SessionRegistry,
    history: HistoryGuard,
}

impl CartService {
    pub fn new(config: CartConfig, history: Arc<dyn OrderHistorySource>) -> Self {
        let history = HistoryGuard::from_config(history, &config);
        CartService {
            config,
            sessions: SessionRegistry::new(),
            history,
        }
    }

    /// Opens the SQLite order history at `config.database_path` and builds
    /// a service on top of it.
    pub async fn open(config: CartConfig) -> Result<Self, ApiError> {
        info!(path = %config.database_path.display(), "Opening cart service");

        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ApiError::internal(format!("Cannot create data dir: {}", e)))?;
            }
        }

        let db = Database::new(DbConfig::new(&config.database_path)).await?;
        Ok(CartService::new(config, Arc::new(db)))
    }

    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Gets the buyer's cart. Buyers without a session see an empty cart.
    pub async fn get_cart(&self, buyer_id: &str) -> CartResponse {
        debug!(buyer_id, "get_cart command");

        match self.sessions.get(buyer_id).await {
            Some(session) => {
                session
                    .with_cart(|cart| CartResponse::from_state(cart, &self.config))
                    .await
            }
            None => self.empty_cart(),
        }
    }

    fn empty_cart(&self) -> CartResponse {
        CartResponse::from_state(&CartState::new(), &self.config)
    }

    /// Adds a product to the buyer's cart.
    ///
    /// ## Behavior
    /// - Every cart rule is checked first, without touching the cart
    /// - A free item is then checked against the buyer's order history
    /// - Only then is the item added (or its quantity increased)
    ///
    /// The session stays locked throughout, so a second command from the
    /// same buyer waits for this one.
    pub async fn add_to_cart(
        &self,
        buyer_id: &str,
        product: &Product,
        quantity: i64,
    ) -> Result<CartResponse, ApiError> {
        debug!(buyer_id, product_id = %product.id, quantity, "add_to_cart command");

        let session = self.sessions.get_or_create(buyer_id).await;
        let mut cart = session.lock().await;

        if let Err(err) = cart.validate_add(product, quantity) {
            return Err(reject(&mut cart, err));
        }

        if product.is_free() {
            let conflict = self
                .history
                .check_order_history(buyer_id, &product.name)
                .await;
            if let Some(err) = conflict.to_error(&product.name) {
                return Err(reject(&mut cart, err));
            }
        }

        cart.add_item(product, quantity)?;
        Ok(CartResponse::from_state(&cart, &self.config))
    }

    /// Adds a product given as a raw catalog record.
    ///
    /// A malformed record is rejected with `VALIDATION_ERROR` and the
    /// message is kept in the cart like any other rejection.
    pub async fn add_record_to_cart(
        &self,
        buyer_id: &str,
        record: ProductRecord,
        quantity: i64,
    ) -> Result<CartResponse, ApiError> {
        match Product::try_from(record) {
            Ok(product) => self.add_to_cart(buyer_id, &product, quantity).await,
            Err(err) => {
                let session = self.sessions.get_or_create(buyer_id).await;
                let mut cart = session.lock().await;
                Err(reject(&mut cart, err))
            }
        }
    }

    /// Sets the quantity of a line. Unknown ids leave the cart unchanged.
    ///
    /// This and the other edit commands below never start a session: a
    /// buyer without one gets an empty cart back.
    pub async fn update_cart_item(
        &self,
        buyer_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> Result<CartResponse, ApiError> {
        debug!(buyer_id, product_id, quantity, "update_cart_item command");

        let Some(session) = self.sessions.get(buyer_id).await else {
            return Ok(self.empty_cart());
        };
        session
            .with_cart_mut(|cart| {
                cart.update_quantity(product_id, quantity)?;
                Ok::<_, ApiError>(CartResponse::from_state(cart, &self.config))
            })
            .await
    }

    /// Removes a line. Removing the last one unlocks the seller.
    pub async fn remove_from_cart(&self, buyer_id: &str, product_id: &str) -> CartResponse {
        debug!(buyer_id, product_id, "remove_from_cart command");

        let Some(session) = self.sessions.get(buyer_id).await else {
            return self.empty_cart();
        };
        session
            .with_cart_mut(|cart| {
                cart.remove_item(product_id);
                CartResponse::from_state(cart, &self.config)
            })
            .await
    }

    pub async fn clear_cart(&self, buyer_id: &str) -> CartResponse {
        debug!(buyer_id, "clear_cart command");

        let Some(session) = self.sessions.get(buyer_id).await else {
            return self.empty_cart();
        };
        session
            .with_cart_mut(|cart| {
                cart.clear_cart();
                CartResponse::from_state(cart, &self.config)
            })
            .await
    }

    /// Dismisses the last rejection message.
    pub async fn clear_error(&self, buyer_id: &str) -> CartResponse {
        debug!(buyer_id, "clear_error command");

        let Some(session) = self.sessions.get(buyer_id).await else {
            return self.empty_cart();
        };
        session
            .with_cart_mut(|cart| {
                cart.clear_error();
                CartResponse::from_state(cart, &self.config)
            })
            .await
    }

    /// What checkout would order right now. `None` for an empty cart.
    pub async fn checkout_draft(&self, buyer_id: &str) -> Option<OrderDraft> {
        let session = self.sessions.get(buyer_id).await?;
        session.with_cart(|cart| cart.checkout_draft()).await
    }

    /// Forgets the buyer's cart. Returns whether there was one.
    pub async fn end_session(&self, buyer_id: &str) -> bool {
        self.sessions.end_session(buyer_id).await
    }
}

/// Stores the rejection in the cart and converts it for the caller.
fn reject(cart: &mut CartState, err: CartError) -> ApiError {
    debug!(error = %err, "Cart action rejected");
    cart.record_error(&err);
    ApiError::from(err)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::history::{HistoryError, InMemoryOrderHistory};
    use async_trait::async_trait;
    use chrono::Utc;
    use farmcart_core::{OrderStatus, PastOrder, PastOrderItem};
    use std::time::Duration;

    fn green_acres() -> Seller {
        Seller::new("s1", "Green Acres")
    }

    fn sunny_farm() -> Seller {
        Seller::new("s2", "Sunny Farm")
    }

    fn tomato() -> Product {
        Product::new("t1", "Tomato", Money::from_rupees(40), green_acres(), 10)
    }

    fn mango_sapling() -> Product {
        Product::new("m1", "Mango Sapling", Money::zero(), green_acres(), 5).with_unit("piece")
    }

    fn past_free(buyer: &str, name: &str, status: OrderStatus) -> PastOrder {
        PastOrder {
            id: "o-42".to_string(),
            buyer_id: buyer.to_string(),
            seller_id: "s1".to_string(),
            status,
            created_at: Utc::now(),
            items: vec![PastOrderItem {
                name: name.to_string(),
                price_per_unit: Money::zero(),
                quantity: 1,
            }],
        }
    }

    fn service_with(history: InMemoryOrderHistory) -> CartService {
        CartService::new(CartConfig::default(), Arc::new(history))
    }

    fn service() -> CartService {
        service_with(InMemoryOrderHistory::new())
    }

    #[tokio::test]
    async fn test_add_and_totals() {
        let service = service();

        let response = service.add_to_cart("buyer-1", &tomato(), 2).await.unwrap();

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.totals.total, Money::from_rupees(80));
        assert_eq!(response.totals.total_display, "₹80.00");
        assert_eq!(response.current_seller, Some(green_acres()));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_cross_seller_rejected_and_recorded() {
        let service = service();
        service.add_to_cart("buyer-1", &tomato(), 1).await.unwrap();

        let onion = Product::new("o1", "Onion", Money::from_rupees(30), sunny_farm(), 10);
        let err = service.add_to_cart("buyer-1", &onion, 1).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::CrossSeller);
        assert_eq!(
            err.message,
            "Items in cart are from Green Acres. Please clear your cart to add items from a different seller."
        );

        let cart = service.get_cart("buyer-1").await;
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.error.as_deref(), Some(err.message.as_str()));

        let cart = service.clear_error("buyer-1").await;
        assert!(cart.error.is_none());
        assert_eq!(cart.items.len(), 1);
    }

    #[tokio::test]
    async fn test_history_conflict_blocks_free_item() {
        let history = InMemoryOrderHistory::with_orders([past_free(
            "buyer-1",
            "Mango Sapling",
            OrderStatus::Completed,
        )]);
        let service = service_with(history);

        let err = service
            .add_to_cart("buyer-1", &mango_sapling(), 1)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::FreeItemLimit);
        assert!(err.message.contains("o-42"));

        let cart = service.get_cart("buyer-1").await;
        assert!(cart.items.is_empty());
        assert!(cart.current_seller.is_none());
        assert_eq!(cart.error.as_deref(), Some(err.message.as_str()));

        // Another buyer is unaffected
        service.add_to_cart("buyer-2", &mango_sapling(), 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_history_does_not_block() {
        let history = InMemoryOrderHistory::with_orders([past_free(
            "buyer-1",
            "Mango Sapling",
            OrderStatus::Cancelled,
        )]);
        let service = service_with(history);

        let response = service.add_to_cart("buyer-1", &mango_sapling(), 1).await.unwrap();
        assert_eq!(response.totals.free_item_count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_free_item_in_cart() {
        let service = service();
        service.add_to_cart("buyer-1", &mango_sapling(), 1).await.unwrap();

        let other_mango =
            Product::new("m2", "Mango Seedling", Money::zero(), green_acres(), 5);
        let err = service
            .add_to_cart("buyer-1", &other_mango, 1)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::FreeItemLimit);
        assert_eq!(service.get_cart("buyer-1").await.items.len(), 1);
    }

    struct BrokenHistory;

    #[async_trait]
    impl OrderHistorySource for BrokenHistory {
        async fn orders_for_buyer(&self, _: &str) -> Result<Vec<PastOrder>, HistoryError> {
            Err(HistoryError::Unavailable("503".into()))
        }
    }

    struct StalledHistory;

    #[async_trait]
    impl OrderHistorySource for StalledHistory {
        async fn orders_for_buyer(&self, buyer: &str) -> Result<Vec<PastOrder>, HistoryError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![past_free(buyer, "Mango Sapling", OrderStatus::Completed)])
        }
    }

    #[tokio::test]
    async fn test_history_failure_allows_add() {
        let service = CartService::new(CartConfig::default(), Arc::new(BrokenHistory));

        let response = service.add_to_cart("buyer-1", &mango_sapling(), 1).await.unwrap();
        assert_eq!(response.items.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_timeout_allows_add() {
        let service = CartService::new(CartConfig::default(), Arc::new(StalledHistory));

        let response = service.add_to_cart("buyer-1", &mango_sapling(), 1).await.unwrap();
        assert_eq!(response.items.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_history_check() {
        let config = CartConfig {
            history_check_enabled: false,
            ..CartConfig::default()
        };
        let history = InMemoryOrderHistory::with_orders([past_free(
            "buyer-1",
            "Mango Sapling",
            OrderStatus::Completed,
        )]);
        let service = CartService::new(config, Arc::new(history));

        service.add_to_cart("buyer-1", &mango_sapling(), 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_paid_item_skips_history() {
        let service = CartService::new(CartConfig::default(), Arc::new(BrokenHistory));
        // Would fail open anyway, but a paid item never reaches the guard
        service.add_to_cart("buyer-1", &tomato(), 3).await.unwrap();
        assert_eq!(service.get_cart("buyer-1").await.totals.total_quantity, 3);
    }

    #[tokio::test]
    async fn test_invalid_record_is_validation_error() {
        let service = service();
        let record: ProductRecord =
            serde_json::from_str(r#"{"id":"x","price":10,"availableQuantity":3}"#).unwrap();

        let err = service
            .add_record_to_cart("buyer-1", record, 1)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(service.get_cart("buyer-1").await.error.is_some());
    }

    #[tokio::test]
    async fn test_valid_record_is_added() {
        let service = service();
        let record: ProductRecord = serde_json::from_str(
            r#"{"id":"t1","name":"Tomato","price":"40.50",
                "owner":{"id":"s1","name":"Green Acres"},"availableQuantity":10}"#,
        )
        .unwrap();

        let response = service.add_record_to_cart("buyer-1", record, 2).await.unwrap();
        assert_eq!(response.totals.total, Money::from_paise(8100));
    }

    #[tokio::test]
    async fn test_update_remove_clear() {
        let service = service();
        service.add_to_cart("buyer-1", &tomato(), 1).await.unwrap();

        let response = service.update_cart_item("buyer-1", "t1", 4).await.unwrap();
        assert_eq!(response.totals.total, Money::from_rupees(160));

        let err = service
            .update_cart_item("buyer-1", "t1", 11)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::QuantityExceeded);

        let err = service.update_cart_item("buyer-1", "t1", 0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let unchanged = service.update_cart_item("buyer-1", "nope", 2).await.unwrap();
        assert_eq!(unchanged.totals.total_quantity, 4);

        let response = service.remove_from_cart("buyer-1", "t1").await;
        assert!(response.items.is_empty());
        assert!(response.current_seller.is_none());

        service.add_to_cart("buyer-1", &tomato(), 1).await.unwrap();
        let response = service.clear_cart("buyer-1").await;
        assert_eq!(response.totals.total, Money::zero());
    }

    #[tokio::test]
    async fn test_checkout_draft_and_end_session() {
        let service = service();
        assert!(service.checkout_draft("buyer-1").await.is_none());

        service.add_to_cart("buyer-1", &tomato(), 2).await.unwrap();
        let draft = service.checkout_draft("buyer-1").await.unwrap();
        assert_eq!(draft.seller, green_acres());
        assert_eq!(draft.total, Money::from_rupees(80));

        assert!(service.end_session("buyer-1").await);
        assert!(service.get_cart("buyer-1").await.items.is_empty());
        assert!(service.checkout_draft("buyer-1").await.is_none());
    }

    #[tokio::test]
    async fn test_get_cart_does_not_start_session() {
        let service = service();
        let response = service.get_cart("ghost").await;

        assert!(response.items.is_empty());
        assert_eq!(response.totals.total_display, "₹0.00");
        assert_eq!(service.sessions().active_count().await, 0);
    }

    #[tokio::test]
    async fn test_edits_without_session_do_not_start_one() {
        let service = service();

        let response = service.remove_from_cart("ghost", "t1").await;
        assert!(response.items.is_empty());
        let response = service.clear_error("ghost").await;
        assert!(response.error.is_none());
        service.clear_cart("ghost").await;
        let response = service.update_cart_item("ghost", "t1", 2).await.unwrap();
        assert_eq!(response.totals.total_quantity, 0);

        assert_eq!(service.sessions().active_count().await, 0);
    }

    #[tokio::test]
    async fn test_large_order_within_stock() {
        let service = service();
        let wheat = Product::new("w1", "Wheat", Money::from_rupees(30), green_acres(), 5000);

        service.add_to_cart("buyer-1", &wheat, 1500).await.unwrap();
        let response = service.update_cart_item("buyer-1", "w1", 1000).await.unwrap();
        assert_eq!(response.totals.total_quantity, 1000);
        assert_eq!(response.totals.total, Money::from_rupees(30_000));
    }

    #[tokio::test]
    async fn test_total_overflow_is_cart_error() {
        let service = service();
        let orchard = Product::new(
            "h1",
            "Heirloom Orchard",
            Money::from_paise(i64::MAX / 2 + 1),
            green_acres(),
            10,
        );

        let err = service.add_to_cart("buyer-1", &orchard, 2).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert!(service.get_cart("buyer-1").await.items.is_empty());
    }

    #[tokio::test]
    async fn test_open_creates_data_directory() {
        let dir = std::env::temp_dir().join(format!("farmcart-open-{}", std::process::id()));
        let config = CartConfig {
            database_path: dir.join("nested").join("farmcart.db"),
            ..CartConfig::default()
        };

        let service = CartService::open(config).await.unwrap();
        service.add_to_cart("buyer-1", &tomato(), 1).await.unwrap();
        assert!(dir.join("nested").join("farmcart.db").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_respect_stock() {
        let service = Arc::new(service());
        let product = tomato(); // 10 kg available

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                let product = product.clone();
                tokio::spawn(async move { service.add_to_cart("buyer-1", &product, 3).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        // 3 + 3 + 3 fits, a fourth would make 12
        assert_eq!(accepted, 3);
        assert_eq!(service.get_cart("buyer-1").await.totals.total_quantity, 9);
    }

    #[tokio::test]
    async fn test_open_with_in_memory_database() {
        let config = CartConfig {
            database_path: ":memory:".into(),
            ..CartConfig::default()
        };

        let service = CartService::open(config).await.unwrap();
        service.add_to_cart("buyer-1", &mango_sapling(), 1).await.unwrap();
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let mut cart = CartState::new();
        cart.add_item(&tomato(), 1).unwrap();

        let json = serde_json::to_value(CartResponse::from_state(&cart, &CartConfig::default()))
            .unwrap();
        assert_eq!(json["totals"]["totalDisplay"], "₹40.00");
        assert_eq!(json["currentSeller"]["name"], "Green Acres");
        assert!(json["error"].is_null());
    }
}
