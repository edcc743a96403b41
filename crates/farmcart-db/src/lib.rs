//! # farmcart-db: Order History Store
//!
//! SQLite storage for buyers' past orders. The free-item guard reads it to
//! find free items a buyer already received.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FarmCart Data Flow                               │
//! │                                                                         │
//! │  CartService::add_to_cart (free item)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  HistoryGuard ──► OrderHistorySource (trait, farmcart-session)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   farmcart-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repository   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  (order.rs)   │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use farmcart_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("farmcart.db")).await?;
//! let orders = db.orders().list_for_buyer("buyer-1").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::order::OrderRepository;
