//! # Document Repository
//!
//! SQLite storage for estimates, orders and invoices.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  documents                                                              │
//! │  ┌──────────┬─────────┬─────────────┬────────┬────────┬──────────────┐ │
//! │  │ id (PK)  │ kind    │ customer_id │ date   │ status │ body (JSON)  │ │
//! │  └──────────┴─────────┴─────────────┴────────┴────────┴──────────────┘ │
//! │        ▲         ▲           ▲          ▲                    │          │
//! │        └─────────┴───────────┴──────────┘                    │          │
//! │          lifted out for filtering            the whole Document,       │
//! │                                              lines and payments        │
//! │                                              included                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Merge-Write
//! A save is `INSERT ... ON CONFLICT(id) DO UPDATE` inside a transaction.
//! The incoming document wins. When the stored row was updated after the
//! incoming copy was loaded, the overwrite still happens and is logged.

use chrono::{DateTime, Utc};
use keystone_core::Document;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{DocumentFilter, DocumentStore};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository for document storage.
///
/// ## Usage
/// ```rust,ignore
/// let repo = DocumentRepository::new(pool);
/// let invoices = repo.list(&DocumentFilter::all().kind(DocumentKind::Invoice)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DocumentRepository { pool }
    }

    /// Lists documents matching `filter`, newest first.
    pub async fn list(&self, filter: &DocumentFilter) -> DbResult<Vec<Document>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT body FROM documents WHERE 1 = 1");

        if let Some(kind) = filter.kind {
            qb.push(" AND kind = ").push_bind(kind);
        }
        if let Some(customer_id) = &filter.customer_id {
            qb.push(" AND customer_id = ").push_bind(customer_id.clone());
        }
        if let Some(from) = filter.from {
            qb.push(" AND date >= ").push_bind(from.format(DATE_FORMAT).to_string());
        }
        if let Some(to) = filter.to {
            qb.push(" AND date <= ").push_bind(to.format(DATE_FORMAT).to_string());
        }
        qb.push(" ORDER BY date DESC, id");

        let bodies: Vec<String> = qb.build_query_scalar().fetch_all(&self.pool).await?;
        debug!(count = bodies.len(), ?filter, "Listed documents");

        bodies.iter().map(|body| decode(body)).collect()
    }

    /// Gets a document by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Document))` - Document found
    /// * `Ok(None)` - Document not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Document>> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM documents WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        body.as_deref().map(decode).transpose()
    }

    /// Merge-writes one document in its own transaction.
    pub async fn save(&self, document: &Document) -> DbResult<Document> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let saved = upsert(&mut tx, document, Utc::now()).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %saved.id, kind = %saved.kind, status = %saved.status, total = %saved.total, "Document saved");
        Ok(saved)
    }

    /// Merge-writes several documents atomically: either all are written or
    /// none are.
    pub async fn save_all(&self, documents: &[Document]) -> DbResult<Vec<Document>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let now = Utc::now();
        let mut saved = Vec::with_capacity(documents.len());
        for doc in documents {
            saved.push(upsert(&mut tx, doc, now).await?);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(count = saved.len(), "Documents saved");
        Ok(saved)
    }

    /// Hard-deletes a document.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting document");

        let result = sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Document", id));
        }

        info!(id = %id, "Document deleted");
        Ok(())
    }

    /// Counts stored documents (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

impl DocumentStore for DocumentRepository {
    async fn list_documents(&self, filter: &DocumentFilter) -> DbResult<Vec<Document>> {
        self.list(filter).await
    }

    async fn get_document(&self, id: &str) -> DbResult<Option<Document>> {
        self.get_by_id(id).await
    }

    async fn save_document(&self, document: &Document) -> DbResult<Document> {
        self.save(document).await
    }

    async fn save_documents(&self, documents: &[Document]) -> DbResult<Vec<Document>> {
        self.save_all(documents).await
    }

    async fn delete_document(&self, id: &str) -> DbResult<()> {
        self.delete(id).await
    }
}

/// Recalculates `document`, stamps it and upserts it on `conn`.
async fn upsert(conn: &mut SqliteConnection, document: &Document, now: DateTime<Utc>) -> DbResult<Document> {
    let mut doc = document.recalculated();
    doc.updated_at = now;

    let stored: Option<(DateTime<Utc>, DateTime<Utc>)> =
        sqlx::query_as("SELECT created_at, updated_at FROM documents WHERE id = ?1")
            .bind(&doc.id)
            .fetch_optional(&mut *conn)
            .await?;

    // The body carries created_at too; it must match the column
    if let Some((created_at, _)) = stored {
        doc.created_at = created_at;
    }

    match stored.map(|(_, updated_at)| updated_at) {
        Some(stored) if stored > document.updated_at => {
            warn!(
                id = %doc.id,
                stored = %stored,
                loaded = %document.updated_at,
                "Overwriting a newer stored copy (last write wins)"
            );
        }
        Some(_) => debug!(id = %doc.id, "Replacing stored document"),
        None => debug!(id = %doc.id, "Inserting new document"),
    }

    let body = serde_json::to_string(&doc)?;

    sqlx::query(
        r#"
        INSERT INTO documents (
            id, kind, customer_id, date, status,
            total_cents, balance_due_cents, body,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id) DO UPDATE SET
            kind = excluded.kind,
            customer_id = excluded.customer_id,
            date = excluded.date,
            status = excluded.status,
            total_cents = excluded.total_cents,
            balance_due_cents = excluded.balance_due_cents,
            body = excluded.body,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&doc.id)
    .bind(doc.kind)
    .bind(&doc.customer_id)
    .bind(doc.date.format(DATE_FORMAT).to_string())
    .bind(doc.status)
    .bind(doc.total.cents())
    .bind(doc.balance_due.cents())
    .bind(body)
    .bind(doc.created_at)
    .bind(doc.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(doc)
}

fn decode(body: &str) -> DbResult<Document> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use keystone_core::{Customer, DocumentKind, DocumentStatus, LineItem, Money, Payment, PaymentMethod};

    async fn setup() -> DocumentRepository {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        db.documents()
    }

    fn doc(id: &str, kind: DocumentKind, customer: &str, day: u32, cents: i64) -> Document {
        let date = NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        let mut doc = Document::new(id, kind, &Customer::new(customer, "Someone"), date);
        doc.line_items.push(LineItem::non_stock("li-1", "Work", 1, Money::from_cents(cents)));
        doc
    }

    #[tokio::test]
    async fn test_save_recalculates_and_round_trips() {
        let repo = setup().await;
        let mut invoice = doc("inv-1", DocumentKind::Invoice, "c-1", 1, 10000);
        invoice.status = DocumentStatus::Sent;
        invoice.payments.push(Payment::new(
            "pay-1",
            invoice.date,
            Money::from_cents(10000),
            PaymentMethod::Check,
        ));

        let saved = repo.save(&invoice).await.unwrap();
        assert_eq!(saved.status, DocumentStatus::Paid);

        let loaded = repo.get_by_id("inv-1").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(loaded.balance_due.is_zero());
    }

    #[tokio::test]
    async fn test_save_is_merge_write() {
        let repo = setup().await;
        let first = repo.save(&doc("ord-1", DocumentKind::Order, "c-1", 1, 500)).await.unwrap();

        let mut edited = first.clone();
        edited.line_items.clear();
        edited.status = DocumentStatus::Completed;
        repo.save(&edited).await.unwrap();

        let loaded = repo.get_by_id("ord-1").await.unwrap().unwrap();
        assert!(loaded.line_items.is_empty());
        assert_eq!(loaded.status, DocumentStatus::Completed);
        assert_eq!(loaded.created_at, first.created_at);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_copy_still_wins() {
        let repo = setup().await;
        let loaded = repo.save(&doc("inv-1", DocumentKind::Invoice, "c-1", 1, 500)).await.unwrap();

        let mut session_a = loaded.clone();
        session_a.notes = Some("from A".to_string());
        let mut session_b = loaded;
        session_b.notes = Some("from B".to_string());

        repo.save(&session_a).await.unwrap();
        repo.save(&session_b).await.unwrap();

        let stored = repo.get_by_id("inv-1").await.unwrap().unwrap();
        assert_eq!(stored.notes.as_deref(), Some("from B"));
    }

    #[tokio::test]
    async fn test_resave_keeps_original_created_at() {
        let repo = setup().await;
        let first = repo.save(&doc("est-1", DocumentKind::Estimate, "c-1", 1, 500)).await.unwrap();

        let mut rebuilt = doc("est-1", DocumentKind::Estimate, "c-1", 1, 900);
        rebuilt.created_at = first.created_at + chrono::Duration::days(3);
        let saved = repo.save(&rebuilt).await.unwrap();
        assert_eq!(saved.created_at, first.created_at);

        let loaded = repo.get_by_id("est-1").await.unwrap().unwrap();
        assert_eq!(loaded.created_at, first.created_at);
        assert_eq!(loaded.total.cents(), 900);

        let listed = repo.list(&DocumentFilter::all()).await.unwrap();
        assert_eq!(listed[0].created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let repo = setup().await;
        repo.save_all(&[
            doc("inv-1", DocumentKind::Invoice, "c-1", 1, 100),
            doc("inv-2", DocumentKind::Invoice, "c-2", 5, 100),
            doc("est-1", DocumentKind::Estimate, "c-1", 9, 100),
        ])
        .await
        .unwrap();

        let all = repo.list(&DocumentFilter::all()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["est-1", "inv-2", "inv-1"]);

        let invoices = repo.list(&DocumentFilter::all().kind(DocumentKind::Invoice)).await.unwrap();
        assert_eq!(invoices.len(), 2);

        let c1 = repo.list(&DocumentFilter::all().customer("c-1")).await.unwrap();
        assert_eq!(c1.len(), 2);

        let ranged = repo
            .list(&DocumentFilter::all().between(
                NaiveDate::from_ymd_opt(2026, 3, 2),
                NaiveDate::from_ymd_opt(2026, 3, 5),
            ))
            .await
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].id, "inv-2");
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        repo.save(&doc("est-1", DocumentKind::Estimate, "c-1", 1, 100)).await.unwrap();

        repo.delete("est-1").await.unwrap();
        assert!(repo.get_by_id("est-1").await.unwrap().is_none());

        let err = repo.delete("est-1").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
