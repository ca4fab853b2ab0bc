//! # Seed Data Generator
//!
//! Fills a database with a demo business, a small catalog and a handful of
//! receipts so the app has something to show.
//!
//! ## Usage
//! ```bash
//! # Seed the default app database
//! cargo run -p slipbook-db --bin seed
//!
//! # Seed a scratch file with more receipts
//! cargo run -p slipbook-db --bin seed -- --db ./slipbook_dev.db --receipts 12
//! ```
//!
//! The monthly receipt limit from `SLIPBOOK_MONTHLY_RECEIPT_LIMIT` still
//! applies; seeding stops once it is reached.

use chrono::{Duration, Utc};
use slipbook_core::draft::ReceiptDraft;
use slipbook_core::format::format_receipt_text;
use slipbook_core::{BusinessProfileInput, InventoryItemInput, Money, PaymentStatus};
use slipbook_db::{generate_receipt_number, AppConfig, Database, DbError};
use std::env;
use std::path::PathBuf;
use tracing::info;

const BUSINESS_NAME: &str = "Mama Nkechi Provisions";

/// Catalog entries: (name, description, price in kobo)
const CATALOG: &[(&str, Option<&str>, i64)] = &[
    ("Bag of Rice 50kg", Some("Long grain parboiled"), 8_000_000),
    ("Groundnut Oil 5L", None, 1_250_000),
    ("Indomie Carton", Some("40 packs, chicken flavour"), 950_000),
    ("Peak Milk Tin", None, 45_000),
    ("Bar Soap", Some("Laundry, blue"), 30_000),
    ("Sugar Cube Pack", None, 60_000),
    ("Bottled Water 75cl", None, 20_000),
    ("Palm Oil 1L", Some("Fresh, unbleached"), 250_000),
];

const CUSTOMERS: &[(&str, Option<&str>)] = &[
    ("Jane Okafor", Some("0803 123 4567")),
    ("Emeka Obi", None),
    ("Aisha Bello", Some("0812 555 0000")),
    ("Tunde Bakare", None),
    ("Ngozi Eze", Some("0706 777 1212")),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    slipbook_db::init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config = AppConfig::from_env()?;
    let mut receipt_count: usize = 6;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--receipts" | "-r" => {
                if i + 1 < args.len() {
                    receipt_count = args[i + 1].parse().unwrap_or(6);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Slipbook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -r, --receipts <N>  Number of receipts to create (default: 6)");
                println!("  -d, --db <PATH>     Database file path (default: app data dir)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Slipbook Seed Data Generator");
    println!("===============================");
    println!("Database: {}", config.database_path.display());
    println!("Receipts: {}", receipt_count);
    println!();

    let db = Database::open(config.db_config()).await?;
    let (known, applied) = db.migration_status().await?;

    println!("✓ Connected to database");
    println!("✓ Schema at {}/{} migrations", applied, known);

    // Profile
    let mut profile = BusinessProfileInput::new(BUSINESS_NAME, "0809 000 1111");
    profile.address = Some("12 Market Road, Onitsha".to_string());
    profile.cac_number = Some("BN 1234567".to_string());
    db.business_profile().save(&profile).await?;
    println!("✓ Business profile: {}", BUSINESS_NAME);

    // Catalog
    let inventory = db.inventory();
    let existing = inventory.count().await?;
    if existing > 0 {
        println!("⚠ Catalog already has {} items, leaving it alone", existing);
    } else {
        for (name, description, price) in CATALOG {
            let mut input = InventoryItemInput::new(*name, Money::from_kobo(*price));
            if let Some(description) = description {
                input = input.with_description(*description);
            }
            inventory.create(&input).await?;
        }
        println!("✓ Added {} catalog items", CATALOG.len());
    }

    // Receipts
    println!();
    println!("Generating receipts...");

    let catalog = inventory.get_all().await?;
    let usage = db.usage(config.monthly_receipt_limit);
    let receipts = db.receipts();
    let now = Utc::now();
    let mut created = 0;

    for n in 0..receipt_count {
        match usage.ensure_can_create().await {
            Ok(()) => {}
            Err(DbError::UsageLimitReached { used, limit }) => {
                println!("⚠ Monthly limit reached ({}/{}), stopping", used, limit);
                break;
            }
            Err(e) => return Err(e.into()),
        }

        let (customer, phone) = CUSTOMERS[n % CUSTOMERS.len()];
        let mut draft = ReceiptDraft::new(customer);
        draft.customer_phone = phone.map(str::to_string);

        for offset in 0..(1 + n % 3) {
            let item = &catalog[(n * 3 + offset) % catalog.len()];
            draft.add_inventory_item(item, (1 + (n + offset) % 4) as f64);
        }

        match n % 4 {
            0 => draft.set_payment(Some(PaymentStatus::Paid), None),
            1 => {
                let half = Money::from_kobo(draft.total().kobo() / 2);
                draft.set_payment(Some(PaymentStatus::PartPaid), Some(half));
            }
            2 => draft.set_payment(Some(PaymentStatus::NotPaid), None),
            _ => draft.notes = Some("Delivered to shop".to_string()),
        }

        let created_at = now - Duration::minutes((receipt_count - n) as i64 * 37);
        let (header, items) = draft.build(generate_receipt_number(BUSINESS_NAME), created_at)?;

        if let Err(e) = receipts.save(&header, &items).await {
            eprintln!("Failed to save {}: {}", header.receipt_number, e);
            continue;
        }

        info!(number = %header.receipt_number, total = %header.total(), "Seeded receipt");
        created += 1;
    }

    println!("✓ Created {} receipts", created);

    let summary = db.reports().summary(None).await?;
    println!();
    println!("  Billed:      {}", Money::from_kobo(summary.billed_kobo));
    println!("  Collected:   {}", Money::from_kobo(summary.collected_kobo));
    println!("  Outstanding: {}", summary.outstanding());

    let latest = receipts.get_all().await?.into_iter().next();
    if let (Some(receipt), Some(profile)) = (latest, db.business_profile().get().await?) {
        println!();
        println!("{}", format_receipt_text(&receipt, &profile, &config.display_offset()));
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;

    Ok(())
}
