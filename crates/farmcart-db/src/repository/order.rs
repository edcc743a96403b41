//! # Order Repository
//!
//! Past orders and their lines, as read by the free-item guard.
//!
//! ## Storage Shape
//! ```text
//! ┌──────────────────────────────┐        ┌──────────────────────────────────┐
//! │ orders                       │ 1    * │ order_items                      │
//! │  id (PK)                     │◄───────│  order_id (FK, cascade)          │
//! │  buyer_id  (indexed)         │        │  position                        │
//! │  seller_id                   │        │  name                            │
//! │  status                      │        │  price_per_unit_paise  (0 = free)│
//! │  created_at (RFC 3339 text)  │        │  quantity                        │
//! └──────────────────────────────┘        └──────────────────────────────────┘
//! ```
//!
//! `list_for_buyer` returns every order regardless of status. Deciding which
//! statuses count toward the free-item allowance belongs to the fairness scan.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use farmcart_core::{Money, OrderStatus, PastOrder, PastOrderItem};

/// Header row of the `orders` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    buyer_id: String,
    seller_id: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

/// Line row of the `order_items` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: String,
    name: String,
    price_per_unit_paise: i64,
    quantity: i64,
}

impl OrderRow {
    fn into_order(self, items: Vec<PastOrderItem>) -> PastOrder {
        PastOrder {
            id: self.id,
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            status: self.status,
            created_at: self.created_at,
            items,
        }
    }
}

impl From<OrderItemRow> for PastOrderItem {
    fn from(row: OrderItemRow) -> Self {
        PastOrderItem {
            name: row.name,
            price_per_unit: Money::from_paise(row.price_per_unit_paise),
            quantity: row.quantity,
        }
    }
}

/// Repository for order history.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order and all its lines in one transaction.
    ///
    /// ## Errors
    /// * `DbError::Duplicate` - an order with this id already exists
    pub async fn insert_order(&self, order: &PastOrder) -> DbResult<()> {
        debug!(
            id = %order.id,
            buyer_id = %order.buyer_id,
            items = order.items.len(),
            "Inserting order"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer_id, seller_id, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&order.id)
        .bind(&order.buyer_id)
        .bind(&order.seller_id)
        .bind(order.status)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::Duplicate { field, .. } => DbError::duplicate(field, order.id.clone()),
            other => other,
        })?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, name, price_per_unit_paise, quantity)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&order.id)
            .bind(position as i64)
            .bind(&item.name)
            .bind(item.price_per_unit.paise())
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Returns all of a buyer's orders, newest first, each with its lines in
    /// their original order.
    pub async fn list_for_buyer(&self, buyer_id: &str) -> DbResult<Vec<PastOrder>> {
        let headers: Vec<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, buyer_id, seller_id, status, created_at
            FROM orders
            WHERE buyer_id = ?1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;

        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let lines: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT oi.order_id, oi.name, oi.price_per_unit_paise, oi.quantity
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.buyer_id = ?1
            ORDER BY oi.order_id, oi.position
            "#,
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<String, Vec<PastOrderItem>> = HashMap::new();
        for line in lines {
            by_order
                .entry(line.order_id.clone())
                .or_default()
                .push(PastOrderItem::from(line));
        }

        let orders: Vec<PastOrder> = headers
            .into_iter()
            .map(|header| {
                let items = by_order.remove(&header.id).unwrap_or_default();
                header.into_order(items)
            })
            .collect();

        debug!(buyer_id, orders = orders.len(), "Loaded order history");

        Ok(orders)
    }

    /// Gets a single order with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PastOrder>> {
        let header: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, buyer_id, seller_id, status, created_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT order_id, name, price_per_unit_paise, quantity
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let items = lines.into_iter().map(PastOrderItem::from).collect();
        Ok(Some(header.into_order(items)))
    }

    /// Changes the status of an order, e.g. when a seller rejects it.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Counts all orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
