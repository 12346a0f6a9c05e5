//! # Argument Parsing
//!
//! clap derives for the `keystone` command line: global options plus one
//! [`Command`].
//!
//! ```text
//! keystone [--config <path>] [--db <path>] <command> [args...]
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use keystone_core::allocation::AllocationPolicy;
use keystone_core::{DocumentKind, Money, PaymentMethod};

const KEYSTONE_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "keystone", version)]
#[command(about = "Keystone back office: estimates, orders, invoices and payments")]
#[command(help_template = KEYSTONE_HELP_TEMPLATE)]
#[command(
    after_help = "Dates are YYYY-MM-DD. Amounts are dollars (\"125.50\").\n\
Methods: cash, check, credit_card, bank_transfer, other.\n\n\
Environment:\n  KEYSTONE_DB_PATH          Database file\n  KEYSTONE_DEFAULT_MARKUP   Fallback markup percentage\n  KEYSTONE_BULK_ALLOCATION  full_amount_each | proportional\n  RUST_LOG                  Log filter"
)]
pub struct Cli {
    /// Configuration file (default: keystone.toml in the platform config dir)
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config_path: Option<PathBuf>,
    /// Database file, overriding configuration and environment
    #[arg(long = "db", value_name = "PATH", global = true)]
    pub db_path: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub kind: Option<DocumentKind>,
    #[arg(long = "customer", value_name = "ID")]
    pub customer_id: Option<String>,
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct PayArgs {
    pub document_id: String,
    #[arg(value_parser = parse_amount)]
    pub amount: Money,
    pub method: PaymentMethod,
    /// Defaults to today.
    #[arg(long, value_name = "DATE")]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct BulkPayArgs {
    pub customer_id: String,
    #[arg(value_parser = parse_amount)]
    pub amount: Money,
    pub method: PaymentMethod,
    #[arg(required = true, value_name = "INVOICE_ID")]
    pub invoice_ids: Vec<String>,
    #[arg(long, value_name = "DATE")]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Overrides `[payments] bulk_allocation`.
    #[arg(long)]
    pub policy: Option<AllocationPolicy>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// List estimates, orders and invoices
    List(ListArgs),
    /// Print one document
    Show { document_id: String },
    /// Fill in missing non-stock costs
    AutoCost {
        document_id: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Add flagged non-stock lines to the catalog
    Promote { document_id: String },
    /// Record a payment
    Pay(PayArgs),
    /// Delete a payment
    Unpay { document_id: String, payment_id: String },
    /// Invoices open for payment
    Outstanding { customer_id: String },
    /// Apply one payment to several invoices
    BulkPay(BulkPayArgs),
    /// Resolve a product's price for a customer
    Price {
        product_id: String,
        customer_id: Option<String>,
    },
    /// List the catalog
    Products,
    /// List customers
    Customers,
    /// Billed / paid / outstanding totals
    Receivables {
        #[arg(long = "customer", value_name = "ID")]
        customer_id: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

fn parse_amount(value: &str) -> Result<Money, String> {
    Money::parse(value).ok_or_else(|| format!("invalid amount '{}'", value))
}
