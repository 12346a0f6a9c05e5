//! # Application State
//!
//! What every command receives: the store and the loaded configuration.
//!
//! ## Thread Safety
//! Both halves are read-only from the command's point of view. `Database`
//! wraps a `SqlitePool` and `MemoryStore` an `Arc` of locked maps, so
//! either can be shared across tasks without extra locking.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn show<S: DocumentStore>(state: &AppState<S>, id: &str) -> Result<..., ApiError> {
//!     let doc = load_document(&state.store, id).await?;
//!     ...
//! }
//! ```

use keystone_db::{Database, DbConfig};
use tracing::info;

use crate::config::AppConfig;
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct AppState<S> {
    pub store: S,
    pub config: AppConfig,
}

impl<S> AppState<S> {
    pub fn new(store: S, config: AppConfig) -> Self {
        AppState { store, config }
    }
}

impl AppState<Database> {
    /// Opens the configured SQLite database and applies pending migrations.
    pub async fn open(config: AppConfig) -> Result<Self, ApiError> {
        let path = config.database_path()?;
        info!(path = %path.display(), "Opening database");

        let db_config = DbConfig::new(path).max_connections(config.database.max_connections);
        let db = Database::open(db_config).await?;
        Ok(AppState::new(db, config))
    }
}
