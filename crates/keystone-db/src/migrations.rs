//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied by [`Database::open`](crate::Database::open).
//!
//! ```text
//!   001_initial_schema.sql   products, customers, documents (+ indexes)
//! ```
//!
//! Applied versions are recorded in `_sqlx_migrations`. A shipped file is
//! never edited; schema changes go in a new `NNN_description.sql`.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every embedded migration the database has not seen yet.
pub(crate) async fn apply(pool: &SqlitePool) -> DbResult<()> {
    let applied = applied_versions(pool).await?;
    let pending: Vec<i64> = MIGRATOR
        .iter()
        .map(|m| m.version)
        .filter(|v| !applied.contains(v))
        .collect();

    if pending.is_empty() {
        debug!(version = ?applied.last(), "Schema is current");
        return Ok(());
    }

    info!(?pending, "Applying schema migrations");
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Versions recorded as applied, oldest first. A brand new file has none.
async fn applied_versions(pool: &SqlitePool) -> DbResult<Vec<i64>> {
    let tracked: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;

    if tracked.is_none() {
        return Ok(Vec::new());
    }

    let versions = sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version")
        .fetch_all(pool)
        .await?;
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_open_applies_every_migration_once() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();

        let applied = applied_versions(db.pool()).await.unwrap();
        let embedded: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert_eq!(applied, embedded);

        // A second pass finds nothing to do
        apply(db.pool()).await.unwrap();
        assert_eq!(applied_versions(db.pool()).await.unwrap().len(), embedded.len());
    }

    #[tokio::test]
    async fn test_schema_has_back_office_tables() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('products', 'customers', 'documents') ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, vec!["customers", "documents", "products"]);
    }
}
