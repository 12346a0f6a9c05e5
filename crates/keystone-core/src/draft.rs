//! # Drafts
//!
//! Staged edits against a loaded document.
//!
//! ## Lifecycle
//! ```text
//!   store ──load──► DocumentDraft::new(doc)
//!                     │  snapshot = doc   (what the store has)
//!                     │  working  = doc   (what the form shows)
//!                     │
//!                     ├── add_line_item / remove_line_item / set_status ...
//!                     │       touch `working` only, then recalculate it
//!                     │
//!                     ├── discard()          working = snapshot
//!                     │
//!                     └── commit (keystone-db) validate, merge-write
//!                                            working, mark_committed(saved)
//! ```
//!
//! Nothing is written until commit, so a half-finished edit never reaches
//! the store.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger;
use crate::types::{Document, DocumentStatus, LineItem, Payment};
use crate::MAX_LINE_ITEMS;

/// A loaded document plus the edits made to it since.
#[derive(Debug, Clone)]
pub struct DocumentDraft {
    snapshot: Document,
    working: Document,
}

impl DocumentDraft {
    pub fn new(document: Document) -> Self {
        DocumentDraft {
            snapshot: document.clone(),
            working: document,
        }
    }

    /// The edited copy, recalculated after every edit.
    pub fn working(&self) -> &Document {
        &self.working
    }

    /// The document as last loaded or committed.
    pub fn snapshot(&self) -> &Document {
        &self.snapshot
    }

    pub fn id(&self) -> &str {
        &self.working.id
    }

    pub fn is_dirty(&self) -> bool {
        self.working != self.snapshot
    }

    /// Names of the top-level fields that differ from the snapshot.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let (a, b) = (&self.snapshot, &self.working);
        let mut changed = Vec::new();

        let mut check = |name: &'static str, differs: bool| {
            if differs {
                changed.push(name);
            }
        };
        check("customer", a.customer_id != b.customer_id || a.customer_name != b.customer_name);
        check("date", a.date != b.date);
        check("line_items", a.line_items != b.line_items);
        check("tax_rate", a.tax_rate != b.tax_rate);
        check("total", a.total != b.total);
        check("status", a.status != b.status);
        check("payments", a.payments != b.payments);
        check("balance_due", a.balance_due != b.balance_due);
        check("notes", a.notes != b.notes);

        changed
    }

    // =========================================================================
    // Edits
    // =========================================================================

    pub fn add_line_item(&mut self, item: LineItem) -> CoreResult<()> {
        if self.working.line_items.len() >= MAX_LINE_ITEMS {
            return Err(ValidationError::OutOfRange {
                field: "line items".to_string(),
                min: 0,
                max: MAX_LINE_ITEMS as i64,
            }
            .into());
        }

        self.working.line_items.push(item);
        self.working.recalculate();
        Ok(())
    }

    /// Removes a line by id, returning it if it was there.
    pub fn remove_line_item(&mut self, line_item_id: &str) -> Option<LineItem> {
        let index = self
            .working
            .line_items
            .iter()
            .position(|item| item.id == line_item_id)?;
        let removed = self.working.line_items.remove(index);
        self.working.recalculate();
        Some(removed)
    }

    /// Replaces every line at once (the form's "save lines" path).
    pub fn replace_line_items(&mut self, items: Vec<LineItem>) {
        self.working.line_items = items;
        self.working.recalculate();
    }

    pub fn add_payment(&mut self, payment: Payment) -> CoreResult<()> {
        ledger::record_payment(&mut self.working, payment)
    }

    pub fn remove_payment(&mut self, payment_id: &str) -> CoreResult<Payment> {
        ledger::remove_payment(&mut self.working, payment_id)
    }

    /// Selects a status. For invoices the ledger may still override it
    /// (Paid / Partially Paid) on recalculation.
    pub fn set_status(&mut self, status: DocumentStatus) -> CoreResult<()> {
        if !self.working.kind.allows_status(status) {
            return Err(CoreError::InvalidStatus {
                kind: self.working.kind,
                status,
            });
        }

        self.working.status = status;
        self.working.recalculate();
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.working.notes = notes;
    }

    /// Arbitrary edit to the working copy, recalculated afterwards.
    pub fn edit(&mut self, f: impl FnOnce(&mut Document)) {
        f(&mut self.working);
        self.working.recalculate();
    }

    // =========================================================================
    // Commit / Discard
    // =========================================================================

    /// Throws away every edit since the last load or commit.
    pub fn discard(&mut self) {
        self.working = self.snapshot.clone();
    }

    /// Records that `saved` is now what the store holds; the draft is clean.
    pub fn mark_committed(&mut self, saved: Document) {
        self.snapshot = saved.clone();
        self.working = saved;
    }

    pub fn into_working(self) -> Document {
        self.working
    }
}
