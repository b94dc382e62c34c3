//! # Seed Data Generator
//!
//! Populates the database with demo sales for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 sales (default)
//! cargo run -p tally-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p tally-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Sales
//! Every sale is built through the `Sale` aggregate and validated before
//! insert, so seeded rows obey the same rules as API writes:
//! - Sale number: `SEED-{INDEX}`
//! - Date: spread over the last 90 days
//! - 1 to 4 lines from a fixed catalog, 1 to 20 units each (all tiers)
//! - Every 10th sale is cancelled

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use std::env;
use tally_core::{Branch, Customer, Money, NewSaleLine, Product, Sale};
use tally_db::{Database, DbConfig, SaleQuery};
use uuid::Uuid;

/// Demo catalog: (title, unit price in cents)
const CATALOG: &[(&str, i64)] = &[
    ("Pilsen 350ml", 399),
    ("Pilsen 600ml", 749),
    ("IPA 473ml", 1290),
    ("Stout 500ml", 1450),
    ("Lager 6-Pack", 2199),
    ("Lager 12-Pack", 3999),
    ("Sparkling Water 500ml", 250),
    ("Guarana 2L", 899),
    ("Tonic Water 350ml", 450),
    ("Energy Drink 250ml", 799),
];

const CUSTOMERS: &[&str] = &["Ana Souza", "Bruno Lima", "Carla Dias", "Diego Alves", "Eva Rocha"];

const BRANCHES: &[(&str, &str)] = &[
    ("Downtown", "100 Main St"),
    ("Harbor", "8 Pier Rd"),
    ("Airport", "Terminal 2"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of sales to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Sales:    {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.sales().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} sales", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let catalog: Vec<Product> = CATALOG
        .iter()
        .map(|(title, _)| Product::new(Uuid::new_v4(), *title))
        .collect();
    let customers: Vec<Customer> = CUSTOMERS
        .iter()
        .map(|name| Customer::new(Uuid::new_v4(), *name))
        .collect();
    let branches: Vec<Branch> = BRANCHES
        .iter()
        .map(|(name, address)| Branch::new(Uuid::new_v4(), *name, *address))
        .collect();

    println!();
    println!("Generating sales...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    for seed in 0..count {
        let sale = generate_sale(seed, &catalog, &customers, &branches)?;

        let report = sale.validate();
        if !report.is_valid() {
            bail!("generated invalid sale {}: {}", sale.sale_number(), report);
        }

        if let Err(e) = db.sales().create(&sale).await {
            eprintln!("Failed to insert {}: {}", sale.sale_number(), e);
            continue;
        }

        generated += 1;
        if generated % 50 == 0 {
            println!("  Generated {} sales...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} sales in {:?}", generated, elapsed);

    let listed = db
        .sales()
        .list(&SaleQuery::new(1, 1))
        .await?
        .total_count;
    println!("  Listed back: {} sales", listed);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one deterministic sale from the seed index.
fn generate_sale(
    seed: usize,
    catalog: &[Product],
    customers: &[Customer],
    branches: &[Branch],
) -> anyhow::Result<Sale> {
    let date = Utc::now()
        - Duration::days((seed % 90) as i64)
        - Duration::minutes((seed * 37 % 1440) as i64);
    let customer = &customers[seed % customers.len()];
    let branch = &branches[seed % branches.len()];

    let mut sale = Sale::new(format!("SEED-{:05}", seed + 1), date, Some(customer), Some(branch));

    let line_count = 1 + seed % 4;
    let lines = (0..line_count).map(|n| {
        let index = (seed * 7 + n * 3) % catalog.len();
        // 1..=20 so every discount tier appears
        let quantity = 1 + ((seed * 13 + n * 5) % 20) as i64;
        NewSaleLine::new(
            catalog[index].clone(),
            quantity,
            Money::from_cents(CATALOG[index].1),
        )
    });

    // Distinct products per sale: line_count ≤ 4 and the stride never repeats
    // an index within 4 steps of a 10-item catalog
    sale.add_items(lines)?;

    if seed % 10 == 9 {
        sale.cancel();
    }

    Ok(sale)
}
