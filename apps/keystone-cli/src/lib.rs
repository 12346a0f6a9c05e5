//! # Keystone CLI Library
//!
//! Everything behind the `keystone` binary: argument parsing,
//! configuration, logging setup and command dispatch.
//!
//! ## Module Organization
//! ```text
//! keystone_cli/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── cli.rs          ◄─── argv → Command
//! ├── config.rs       ◄─── keystone.toml + KEYSTONE_* env
//! ├── state.rs        ◄─── AppState<S> (store + config)
//! ├── commands/
//! │   ├── mod.rs      ◄─── dispatch
//! │   ├── document.rs ◄─── list, show, auto-cost, promote
//! │   ├── payment.rs  ◄─── pay, unpay, outstanding, bulk-pay
//! │   ├── catalog.rs  ◄─── price, products, customers
//! │   └── report.rs   ◄─── receivables
//! └── error.rs        ◄─── ApiError for command failures
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Initialize Logging                                                  │
//! │     • tracing-subscriber with env filter, written to stderr             │
//! │     • Default: info,keystone=debug,sqlx=warn; RUST_LOG overrides       │
//! │                                                                         │
//! │  2. Parse argv with clap (help needs nothing else)                      │
//! │                                                                         │
//! │  3. Load Configuration                                                  │
//! │     • defaults → keystone.toml → KEYSTONE_* → --db                      │
//! │                                                                         │
//! │  4. Open Database                                                       │
//! │     • macOS: ~/Library/Application Support/com.keystone.backoffice/     │
//! │     • Windows: %APPDATA%\keystone\backoffice\data\                      │
//! │     • Linux: ~/.local/share/backoffice/keystone.db                      │
//! │     • SQLite with WAL mode, pending migrations applied                  │
//! │                                                                         │
//! │  5. Execute the command, print JSON to stdout                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::AppConfig;
use error::ApiError;
use state::AppState;

/// What a successful run prints.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Plain text (help and version).
    Text(String),
    Json(Value),
}

/// Parses `args` (without the program name), loads configuration, opens
/// the database and runs one command.
pub async fn run(args: &[String]) -> Result<Output, ApiError> {
    let cli = match Cli::try_parse_from(std::iter::once("keystone").chain(args.iter().map(String::as_str))) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                return Ok(Output::Text(err.to_string()));
            }
            _ => return Err(ApiError::validation(err.to_string())),
        },
    };
    debug!(command = ?cli.command, "Parsed command line");

    let Some(command) = cli.command else {
        return Ok(Output::Text(Cli::command().render_help().to_string()));
    };

    let mut config = AppConfig::load(cli.config_path.as_deref())?;
    if let Some(path) = cli.db_path {
        config.database.path = Some(path);
    }

    if command == Command::Config {
        return Ok(Output::Json(serde_json::to_value(&config)?));
    }

    info!(business = %config.business.name, "Starting Keystone");
    let state = AppState::open(config).await?;
    let result = commands::execute(&state, command).await;
    state.store.close().await;

    result.map(Output::Json)
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout carries only command output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=keystone_db=trace` - Trace the persistence layer only
/// - Default: `info,keystone=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,keystone=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
