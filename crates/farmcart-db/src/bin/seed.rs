//! # Seed Data Generator
//!
//! Populates the database with demo order history for development.
//!
//! ## Usage
//! ```bash
//! # 3 buyers (default)
//! cargo run -p farmcart-db --bin seed
//!
//! # More buyers
//! cargo run -p farmcart-db --bin seed -- --buyers 20
//!
//! # Specify database path
//! cargo run -p farmcart-db --bin seed -- --db ./data/farmcart.db
//! ```
//!
//! ## Generated Orders
//! Every buyer `buyer-N` gets a handful of orders spread over the last
//! weeks. Some contain a free sapling or seed packet, and one order per
//! buyer is cancelled so its free item does not count.

use chrono::{Duration, Utc};
use farmcart_core::{Money, OrderStatus, PastOrder, PastOrderItem};
use farmcart_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// Sellers and what they grow. Price in paise, `0` is a giveaway.
const SELLERS: &[(&str, &[(&str, i64)])] = &[
    (
        "green-acres",
        &[
            ("Tomato", 4000),
            ("Potato", 3000),
            ("Onion", 3500),
            ("Mango Sapling", 0),
            ("Brinjal", 4500),
        ],
    ),
    (
        "river-farm",
        &[
            ("Spinach", 2500),
            ("Coriander", 1000),
            ("Tulsi Plant", 0),
            ("Carrot", 5000),
        ],
    ),
    (
        "hill-orchard",
        &[
            ("Apple", 15000),
            ("Pear", 12000),
            ("Marigold Seeds", 0),
            ("Walnut", 80000),
        ],
    ),
];

/// Status pattern repeated across a buyer's orders.
const STATUSES: &[OrderStatus] = &[
    OrderStatus::Completed,
    OrderStatus::Accepted,
    OrderStatus::Cancelled,
    OrderStatus::Pending,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut buyers: usize = 3;
    let mut orders_per_buyer: usize = 4;
    let mut db_path = String::from("./farmcart_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--buyers" | "-b" => {
                if i + 1 < args.len() {
                    buyers = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    orders_per_buyer = args[i + 1].parse().unwrap_or(4);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("FarmCart Order History Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --buyers <N>   Number of buyers to generate (default: 3)");
                println!("  -o, --orders <N>   Orders per buyer (default: 4)");
                println!("  -d, --db <PATH>    Database file path (default: ./farmcart_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 FarmCart Order History Seeder");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Buyers:   {}", buyers);
    println!("Orders:   {} per buyer", orders_per_buyer);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.orders().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} orders", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating orders...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    for buyer_idx in 0..buyers {
        let buyer_id = format!("buyer-{}", buyer_idx + 1);

        for order_idx in 0..orders_per_buyer {
            let order = generate_order(&buyer_id, buyer_idx + order_idx, order_idx);

            if let Err(e) = db.orders().insert_order(&order).await {
                eprintln!("Failed to insert order for {}: {}", buyer_id, e);
                continue;
            }

            generated += 1;
        }
    }

    println!("✓ Generated {} orders in {:?}", generated, start.elapsed());

    println!();
    println!("Sample history for buyer-1:");
    for order in db.orders().list_for_buyer("buyer-1").await? {
        let free: Vec<&str> = order
            .items
            .iter()
            .filter(|item| item.is_free())
            .map(|item| item.name.as_str())
            .collect();
        println!(
            "  {} [{}] {} items, free: {:?}",
            order.created_at.format("%Y-%m-%d"),
            order.status,
            order.items.len(),
            free
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one order from a single seller, `order_idx` weeks in the past.
fn generate_order(buyer_id: &str, seed: usize, order_idx: usize) -> PastOrder {
    let (seller_id, catalog) = SELLERS[seed % SELLERS.len()];

    // Two or three lines, rotating through the seller's catalog
    let line_count = 2 + seed % 2;
    let items = (0..line_count)
        .map(|n| {
            let (name, paise) = catalog[(seed + n) % catalog.len()];
            PastOrderItem {
                name: name.to_string(),
                price_per_unit: Money::from_paise(paise),
                quantity: if paise == 0 { 1 } else { 1 + (seed + n) as i64 % 3 },
            }
        })
        .collect();

    PastOrder {
        id: Uuid::new_v4().to_string(),
        buyer_id: buyer_id.to_string(),
        seller_id: seller_id.to_string(),
        status: STATUSES[order_idx % STATUSES.len()],
        created_at: Utc::now() - Duration::weeks(order_idx as i64),
        items,
    }
}
