//! # farmcart-session: Buyer Sessions
//!
//! Runs the cart engine for many buyers at once.
//!
//! ## Module Organization
//! ```text
//! farmcart_session/
//! ├── lib.rs          ◄─── You are here (exports, tracing setup)
//! ├── config.rs       ◄─── CartConfig (env, TOML, defaults)
//! ├── error.rs        ◄─── ApiError returned by every command
//! ├── history.rs      ◄─── OrderHistorySource + HistoryGuard
//! ├── session.rs      ◄─── CartSession, SessionRegistry
//! └── service.rs      ◄─── CartService commands
//! ```
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    add_to_cart(buyer, product, qty)                     │
//! │                                                                         │
//! │  SessionRegistry::get_or_create(buyer)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock buyer's CartState  (held until the end, FIFO across callers)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartState::validate_add ──── Err ──► record error, ApiError           │
//! │       │ Ok                                                              │
//! │       ▼                                                                 │
//! │  free item? ── yes ──► HistoryGuard::check_order_history               │
//! │       │                    │ conflict ──► record error, ApiError        │
//! │       │                    │ lookup failed / timed out ──► allow        │
//! │       ▼                    ▼                                            │
//! │  CartState::add_item ──► CartResponse                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod service;
pub mod session;

pub use config::{CartConfig, ConfigError};
pub use error::{ApiError, ErrorCode};
pub use history::{HistoryError, HistoryGuard, InMemoryOrderHistory, OrderHistorySource};
pub use service::{CartResponse, CartService, CartTotals};
pub use session::{CartSession, SessionRegistry};

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`
/// (normally [`CartConfig::log_filter`]). Calling this more than once, or
/// after the host installed its own subscriber, is a no-op.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=farmcart=trace` - Show trace for farmcart crates only
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
