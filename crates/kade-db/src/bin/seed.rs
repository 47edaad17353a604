//! # Seed Data Generator
//!
//! Populates the database with a small grocery catalog and a few loan
//! customers for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./kade_dev.db
//! cargo run -p kade-db --bin seed
//!
//! # Specify database path
//! cargo run -p kade-db --bin seed -- --db ./data/kade.db
//!
//! # Products only
//! cargo run -p kade-db --bin seed -- --no-loans
//! ```
//!
//! ## Generated Data
//! - Weighed goods (rice, sugar, dhal) sold by the kg
//! - Counted goods (soap, biscuits, soft drinks) sold by the piece
//! - A handful deliberately at or below their reorder level
//! - Loan customers, some with an outstanding balance

use std::env;

use kade_core::{
    CustomerDraft, Money, ProductDraft, Quantity, TransactionType, UnitType,
};
use kade_db::{Database, DbConfig};

/// (name, barcode, price cents, marked price cents, stock milli, category)
const MASS_GOODS: &[(&str, &str, i64, i64, i64, &str)] = &[
    ("Samba Rice", "4790010000011", 26_000, 28_000, 50_000, "Rice"),
    ("Nadu Rice", "4790010000028", 22_000, 23_500, 80_000, "Rice"),
    ("Keeri Samba", "4790010000035", 32_000, 34_000, 25_000, "Rice"),
    ("White Sugar", "4790010000042", 27_500, 29_000, 40_000, "Sugar"),
    ("Brown Sugar", "4790010000059", 31_000, 0, 8_000, "Sugar"),
    ("Red Dhal", "4790010000066", 36_000, 38_000, 30_000, "Grains"),
    ("Green Gram", "4790010000073", 98_000, 0, 5_500, "Grains"),
    ("Wheat Flour", "4790010000080", 19_500, 21_000, 45_000, "Flour"),
    ("Big Onions", "4790010000097", 42_000, 0, 12_000, "Vegetables"),
    ("Potatoes", "4790010000103", 38_000, 0, 0, "Vegetables"),
];

/// (name, barcode, price cents, marked price cents, stock units, category, measure)
const UNIT_GOODS: &[(&str, &str, i64, i64, i64, &str, &str)] = &[
    ("Sunlight Soap", "4791111000012", 17_000, 18_500, 48, "Household", "pieces"),
    ("Lifebuoy Soap", "4791111000029", 15_000, 16_000, 6, "Household", "pieces"),
    ("Marie Biscuits", "4791111000036", 22_000, 24_000, 36, "Biscuits", "packets"),
    ("Cream Crackers", "4791111000043", 35_000, 37_500, 20, "Biscuits", "packets"),
    ("Coca-Cola 1.5L", "4791111000050", 45_000, 48_000, 24, "Beverages", "bottles"),
    ("Elephant House Ginger Beer", "4791111000067", 25_000, 0, 3, "Beverages", "bottles"),
    ("Milk Powder 400g", "4791111000074", 122_000, 130_000, 15, "Dairy", "packets"),
    ("Ceylon Tea 200g", "4791111000081", 48_000, 52_000, 18, "Tea", "packets"),
    ("Coconut Oil 1L", "4791111000098", 78_000, 82_000, 10, "Oil", "bottles"),
    ("Matches", "4791111000104", 1_000, 0, 0, "Household", "boxes"),
];

/// (code, name, phone, opening balance cents)
const CUSTOMERS: &[(&str, &str, &str, i64)] = &[
    ("C001", "Nimal Perera", "0771234567", 125_000),
    ("C002", "Kamala Silva", "0719876543", 0),
    ("C003", "Sunil Bandara", "0762223344", 48_050),
    ("C004", "Ruwani Jayasinghe", "", 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kade_dev.db");
    let mut seed_loans = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--no-loans" => seed_loans = false,
            "--help" | "-h" => {
                println!("Kade POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kade_dev.db)");
                println!("      --no-loans     Skip loan customers");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kade POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Adding products...");

    let mut added = 0;
    let drafts = MASS_GOODS
        .iter()
        .map(|&(name, barcode, price, marked, stock, category)| ProductDraft {
            name: name.to_string(),
            barcode: barcode.to_string(),
            price: Money::from_cents(price),
            marked_price: Money::from_cents(marked),
            quantity: Quantity::from_milli(stock),
            unit_type: UnitType::Mass,
            unit_measure: "kg".to_string(),
            category: Some(category.to_string()),
            supplier: Some("Pettah Wholesale".to_string()),
            description: None,
            reorder_level: Quantity::from_units(10),
        })
        .chain(UNIT_GOODS.iter().map(
            |&(name, barcode, price, marked, stock, category, measure)| ProductDraft {
                name: name.to_string(),
                barcode: barcode.to_string(),
                price: Money::from_cents(price),
                marked_price: Money::from_cents(marked),
                quantity: Quantity::from_units(stock),
                unit_type: UnitType::Unit,
                unit_measure: measure.to_string(),
                category: Some(category.to_string()),
                supplier: None,
                description: None,
                reorder_level: Quantity::from_units(10),
            },
        ));

    for draft in drafts {
        let barcode = draft.barcode.clone();
        if let Err(e) = db.products().insert(draft).await {
            eprintln!("Failed to insert {}: {}", barcode, e);
            continue;
        }
        added += 1;
    }

    println!("✓ Added {} products", added);
    println!("  Low stock: {}", db.products().low_stock().await?.len());

    if seed_loans {
        println!();
        println!("Adding loan customers...");

        for &(code, name, phone, opening) in CUSTOMERS {
            let draft = CustomerDraft {
                customer_code: code.to_string(),
                name: name.to_string(),
                phone: Some(phone.to_string()),
                address: None,
            };
            if let Err(e) = db.loans().create(draft).await {
                eprintln!("Failed to insert {}: {}", code, e);
                continue;
            }
            if opening > 0 {
                db.loans()
                    .record_transaction(
                        code,
                        TransactionType::Purchase,
                        Money::from_cents(opening),
                        None,
                        Some("Opening balance"),
                    )
                    .await?;
            }
        }

        println!("✓ Added {} loan customers", db.loans().list_all().await?.len());
    }

    // Verify lookup
    println!();
    println!("Verifying lookup...");
    let suggestions = db.products().suggest("rice", 8).await?;
    println!("  Suggest 'rice': {} results", suggestions.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
