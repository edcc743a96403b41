//! # Repository Module
//!
//! SQL access for FarmCart, one repository per aggregate.
//!
//! ```text
//! Database::orders()
//!       │
//!       ▼
//! OrderRepository
//! ├── insert_order(&self, order)
//! ├── list_for_buyer(&self, buyer_id)
//! ├── get_by_id(&self, id)
//! └── count(&self)
//!       │
//!       ▼
//! orders + order_items (SQLite)
//! ```

pub mod order;
