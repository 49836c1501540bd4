//! # Ledger Seeder
//!
//! Populates the database with demo loyalty ledgers for development.
//!
//! ## Usage
//! ```bash
//! # Seed 24 customers (default)
//! cargo run -p pawdesk-ledger --bin seed
//!
//! # Seed a custom amount
//! cargo run -p pawdesk-ledger --bin seed -- --customers 100
//!
//! # Specify database path
//! cargo run -p pawdesk-ledger --bin seed -- --db ./data/pawdesk.db
//! ```
//!
//! ## Generated Ledgers
//! Mixes the shapes the register has to handle:
//! - Active memberships across the demo plans
//! - A few past-due and cancelled memberships (benefits must not apply)
//! - Prepaid credit balances in visit and hourly units
//! - The occasional expired balance

use chrono::{Duration, Utc};
use std::env;

use pawdesk_core::{CreditBalance, MembershipStatus, ProductCategory, UserLedger, UserMembership};
use pawdesk_ledger::{Database, DbConfig, LedgerStore};
use uuid::Uuid;

/// Demo membership plans. The register's demo catalog uses the same IDs.
const PLANS: &[&str] = &[
    "plan-club-monthly",
    "plan-club-annual",
    "plan-groom-quarterly",
];

/// Demo credit packages: (package id, category, units, is_hourly)
const PACKAGES: &[(&str, ProductCategory, i64, bool)] = &[
    ("pack-daycare-10", ProductCategory::Service, 10, false),
    ("pack-groom-4", ProductCategory::Grooming, 4, false),
    ("pack-boarding-72h", ProductCategory::Service, 72, true),
];

/// Builds one demo ledger. Deterministic in `index` so reseeding a fresh
/// database produces the same data.
fn build_ledger(index: usize) -> UserLedger {
    let customer_id = format!("cust-{index:04}");
    let now = Utc::now();
    let mut ledger = UserLedger::empty(customer_id.clone());

    // Roughly two thirds of demo customers carry a membership
    if index % 3 != 0 {
        let status = match index % 11 {
            7 => MembershipStatus::PastDue,
            10 => MembershipStatus::Cancelled,
            _ => MembershipStatus::Active,
        };
        ledger.membership = Some(UserMembership {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.clone(),
            definition_id: PLANS[index % PLANS.len()].to_string(),
            status,
            started_at: now - Duration::days((index as i64 % 200) + 1),
            next_bill_at: now + Duration::days(30 - (index as i64 % 28)),
            contract_ref: None,
        });
    }

    // Half carry prepaid balances, some more than one
    if index % 2 == 0 {
        let picks = 1 + (index / 2) % 2;
        for slot in 0..picks {
            let (package_id, category, units, is_hourly) =
                PACKAGES[(index + slot) % PACKAGES.len()];

            // Every ninth customer keeps an expired balance around, so the
            // register's skip-expired path shows up in demos
            let expires_at = if index % 9 == 0 {
                now - Duration::days(1)
            } else {
                now + Duration::days(90)
            };

            ledger.credits.push(CreditBalance {
                id: Uuid::new_v4().to_string(),
                customer_id: customer_id.clone(),
                package_id: package_id.to_string(),
                service_category: category,
                remaining: 1 + (index as i64 + slot as i64) % units,
                is_hourly,
                expires_at,
            });
        }
    }

    ledger
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut customers: usize = 24;
    let mut db_path = String::from("./pawdesk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--customers" | "-n" => {
                if i + 1 < args.len() {
                    customers = args[i + 1].parse().unwrap_or(24);
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
                println!("Pawdesk Ledger Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --customers <N>  Number of customers to seed (default: 24)");
                println!("  -d, --db <PATH>      Database file path (default: ./pawdesk_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Pawdesk Ledger Seeder");
    println!("========================");
    println!("Database:  {}", db_path);
    println!("Customers: {}", customers);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    let (total, applied) = pawdesk_ledger::migrations::migration_status(db.pool()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied ({}/{})", applied, total);

    let store = db.ledgers();

    // Check existing ledgers
    let existing = store.count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} ledgers", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate ledgers
    println!();
    println!("Seeding ledgers...");

    let start = std::time::Instant::now();
    let mut memberships = 0usize;
    let mut balances = 0usize;

    for index in 1..=customers {
        let ledger = build_ledger(index);
        if ledger.membership.is_some() {
            memberships += 1;
        }
        balances += ledger.credits.len();
        store.save(&ledger).await?;
    }

    println!();
    println!("✓ Seeded {} ledgers in {:?}", customers, start.elapsed());
    println!("  {} memberships, {} credit balances", memberships, balances);
    println!();
    println!("Inspect with:");
    println!(
        "  sqlite3 {} \"SELECT customer_id, version FROM ledgers LIMIT 5\"",
        db_path
    );

    Ok(())
}
