//! # Seed Data Generator
//!
//! Populates a database with a sample catalog, customers with markup rules
//! and a handful of documents for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./keystone_dev.db
//! cargo run -p keystone-db --bin seed
//!
//! # Specify database path
//! cargo run -p keystone-db --bin seed -- --db ./data/keystone.db
//! ```
//!
//! ## Generated Data
//! - Products across Fence, Lumber, Concrete and Hardware, priced at cost
//!   plus a per-category markup
//! - Three customers: one with a Fence rule, one with an all-categories
//!   rule, one with no rules
//! - An estimate, an order with a deposit, two invoices (one partially
//!   paid, one with a non-stock line waiting for auto-cost)

use chrono::{Duration, NaiveDate, Utc};
use keystone_core::pricing::{price_line_item, PriceTriangle};
use keystone_core::{
    CategoryScope, Customer, CustomerMarkupRule, Document, DocumentKind, DocumentStatus, LineItem,
    Money, Payment, PaymentMethod, Product,
};
use keystone_db::{generate_id, CatalogStore, Database, DbConfig, DocumentStore};
use std::env;

/// (category, markup %, [(name, unit, cost cents)])
const CATALOG: &[(&str, f64, &[(&str, &str, i64)])] = &[
    (
        "Fence",
        35.0,
        &[
            ("Cedar picket 6ft", "each", 325),
            ("Pressure-treated post 4x4x8", "each", 1149),
            ("Vinyl privacy panel 6x8", "each", 8900),
            ("Chain link roll 4x50", "roll", 8475),
            ("Gate latch, gravity", "each", 1299),
        ],
    ),
    (
        "Lumber",
        30.0,
        &[
            ("2x4x8 SPF stud", "each", 389),
            ("2x6x12 pressure-treated", "each", 1429),
            ("1x6 cedar board", "ft", 245),
        ],
    ),
    (
        "Concrete",
        25.0,
        &[
            ("Fast-setting concrete 50lb", "bag", 695),
            ("Gravel, crushed", "yard", 4200),
        ],
    ),
    (
        "Hardware",
        45.0,
        &[
            ("Deck screws 5lb", "box", 2899),
            ("Galvanized hinge set", "set", 1875),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./keystone_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Keystone Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./keystone_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Keystone Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::open(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    let mut products = Vec::new();
    for (category, markup, items) in CATALOG {
        for (name, unit, cost) in items.iter() {
            let mut product = Product::new(generate_id(), *name, *category, *unit);
            PriceTriangle::from_cost(Money::from_cents(*cost), *markup).apply_to_product(&mut product);
            products.push(db.save_product(&product).await?);
        }
    }
    println!("✓ {} products", products.len());

    // Customers
    let mut contractor = Customer::new(generate_id(), "Ridgeline Fence Co.");
    contractor.email = Some("office@ridgeline.example".to_string());
    contractor.markup_rules = vec![
        CustomerMarkupRule::new(CategoryScope::category("Fence"), 20.0),
        CustomerMarkupRule::new(CategoryScope::category("Lumber"), 18.0),
    ];

    let mut builder = Customer::new(generate_id(), "Harbor Homes");
    builder.phone = Some("555-0142".to_string());
    builder.markup_rules = vec![CustomerMarkupRule::new(CategoryScope::AllCategories, 25.0)];

    let walk_in = Customer::new(generate_id(), "Walk-in");

    for customer in [&contractor, &builder, &walk_in] {
        db.save_customer(customer).await?;
    }
    println!("✓ 3 customers");

    // Documents
    let today = Utc::now().date_naive();
    let documents = vec![
        estimate(&contractor, &products, today - Duration::days(20)),
        order(&builder, &products, today - Duration::days(12)),
        partly_paid_invoice(&contractor, &products, today - Duration::days(30)),
        invoice_with_non_stock(&walk_in, today - Duration::days(3)),
    ];
    let saved = db.save_documents(&documents).await?;
    for doc in &saved {
        println!("  {} {} {} total {} balance {}", doc.kind, doc.id, doc.status, doc.total, doc.balance_due);
    }
    println!("✓ {} documents", saved.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn line(product: &Product, customer: &Customer, quantity: i64) -> LineItem {
    price_line_item(generate_id(), product, Some(customer), quantity)
}

fn estimate(customer: &Customer, products: &[Product], date: NaiveDate) -> Document {
    let mut doc = Document::new(generate_id(), DocumentKind::Estimate, customer, date);
    doc.status = DocumentStatus::Sent;
    doc.line_items = vec![
        line(&products[0], customer, 120),
        line(&products[1], customer, 18),
        line(&products[4], customer, 2),
    ];
    doc.notes = Some("120 ft cedar privacy fence, two gates".to_string());
    doc.recalculate();
    doc
}

fn order(customer: &Customer, products: &[Product], date: NaiveDate) -> Document {
    let mut doc = Document::new(generate_id(), DocumentKind::Order, customer, date);
    doc.status = DocumentStatus::Processing;
    doc.line_items = vec![line(&products[5], customer, 80), line(&products[8], customer, 15)];
    doc.recalculate();

    let deposit = Money::from_cents(doc.total.cents() / 2);
    doc.payments.push(Payment::new(generate_id(), date, deposit, PaymentMethod::Check));
    doc.recalculate();
    doc
}

fn partly_paid_invoice(customer: &Customer, products: &[Product], date: NaiveDate) -> Document {
    let mut doc = Document::new(generate_id(), DocumentKind::Invoice, customer, date);
    doc.status = DocumentStatus::Sent;
    doc.line_items = vec![
        line(&products[2], customer, 10),
        line(&products[1], customer, 11),
        line(&products[2], customer, 1).as_return(),
    ];
    doc.payments.push(Payment::new(
        generate_id(),
        date + Duration::days(7),
        Money::from_cents(50000),
        PaymentMethod::BankTransfer,
    ));
    doc.recalculate();
    doc
}

fn invoice_with_non_stock(customer: &Customer, date: NaiveDate) -> Document {
    let mut doc = Document::new(generate_id(), DocumentKind::Invoice, customer, date);
    doc.status = DocumentStatus::Sent;

    let mut arbor = LineItem::non_stock(generate_id(), "Cedar arbor kit", 1, Money::from_cents(34900));
    arbor.new_product_category = Some("Fence".to_string());
    arbor.unit = Some("kit".to_string());
    arbor.add_to_product_list = true;

    let haul = LineItem::non_stock(generate_id(), "Old fence haul-away", 1, Money::from_cents(15000));

    doc.line_items = vec![arbor, haul];
    doc.recalculate();
    doc
}
