//! # farmcart-core: Pure Cart Logic for FarmCart
//!
//! This crate holds the buyer cart state machine and the free-item fairness
//! rules of the FarmCart marketplace. Everything here is deterministic and
//! free of I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FarmCart Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            UI layer / API routes (external)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        farmcart-session (per-buyer carts, history guard)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ farmcart-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   cart    │  │ fairness  │  │similarity │  │   money   │  │   │
//! │  │   │ CartState │  │ FreeItem  │  │  similar  │  │   Money   │  │   │
//! │  │   │CartAction │  │ Conflict  │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Seller, Product, PastOrder, ...)
//! - [`money`] - Money type with integer arithmetic (paise, never floats)
//! - [`error`] - Cart and validation errors
//! - [`validation`] - Boundary validation of catalog input
//! - [`similarity`] - Product-name fairness heuristic
//! - [`fairness`] - Free-item guard scans (cart and order history)
//! - [`cart`] - The cart reducer
//!
//! ## Example Usage
//!
//! ```rust
//! use farmcart_core::{CartState, Money, Product, Seller};
//!
//! let seller = Seller::new("s1", "Green Acres");
//! let tomato = Product::new("a", "Tomato", Money::from_rupees(20), seller, 5);
//!
//! let mut cart = CartState::new();
//! cart.add_item(&tomato, 2).unwrap();
//! assert_eq!(cart.total(), Money::from_rupees(40));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod fairness;
pub mod money;
pub mod similarity;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartAction, CartLineItem, CartState, OrderDraft};
pub use error::{CartError, CartResult, ValidationError};
pub use fairness::{ConflictingOrder, FreeItemConflict};
pub use money::Money;
pub use similarity::{fairness_category, similar};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unit used when a catalog record does not name one.
pub const DEFAULT_UNIT: &str = "kg";

/// Maximum distinct line items allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;
