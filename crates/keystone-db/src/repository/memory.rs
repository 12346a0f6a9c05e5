//! # In-Memory Store
//!
//! A [`DocumentStore`] + [`CatalogStore`] backed by `BTreeMap`s behind
//! `tokio::sync::RwLock`. Same semantics as the SQLite store (recalculate
//! on save, merge-write, newest-first listings), no persistence.
//!
//! Cloning a `MemoryStore` shares the underlying maps.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use keystone_core::{Customer, Document, Product};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{check_customer, check_product, CatalogStore, DocumentFilter, DocumentStore};

#[derive(Debug, Default)]
struct Tables {
    documents: RwLock<BTreeMap<String, Document>>,
    products: RwLock<BTreeMap<String, Product>>,
    customers: RwLock<BTreeMap<String, Customer>>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// A store pre-filled with fixtures. Documents are stored as given,
    /// without recalculation.
    pub fn with_fixtures(products: Vec<Product>, customers: Vec<Customer>, documents: Vec<Document>) -> Self {
        let tables = Tables {
            documents: RwLock::new(documents.into_iter().map(|d| (d.id.clone(), d)).collect()),
            products: RwLock::new(products.into_iter().map(|p| (p.id.clone(), p)).collect()),
            customers: RwLock::new(customers.into_iter().map(|c| (c.id.clone(), c)).collect()),
        };
        MemoryStore {
            tables: Arc::new(tables),
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn list_documents(&self, filter: &DocumentFilter) -> DbResult<Vec<Document>> {
        let documents = self.tables.documents.read().await;
        let mut matching: Vec<Document> = documents.values().filter(|d| filter.matches(d)).cloned().collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn get_document(&self, id: &str) -> DbResult<Option<Document>> {
        Ok(self.tables.documents.read().await.get(id).cloned())
    }

    async fn save_document(&self, document: &Document) -> DbResult<Document> {
        let mut saved = document.recalculated();
        saved.updated_at = Utc::now();

        let mut documents = self.tables.documents.write().await;
        if let Some(existing) = documents.get(&saved.id) {
            saved.created_at = existing.created_at;
        }
        documents.insert(saved.id.clone(), saved.clone());

        debug!(id = %saved.id, "Document saved in memory");
        Ok(saved)
    }

    async fn save_documents(&self, documents: &[Document]) -> DbResult<Vec<Document>> {
        let now = Utc::now();
        let mut table = self.tables.documents.write().await;

        let mut saved = Vec::with_capacity(documents.len());
        for doc in documents {
            let mut doc = doc.recalculated();
            doc.updated_at = now;
            if let Some(existing) = table.get(&doc.id) {
                doc.created_at = existing.created_at;
            }
            table.insert(doc.id.clone(), doc.clone());
            saved.push(doc);
        }
        Ok(saved)
    }

    async fn delete_document(&self, id: &str) -> DbResult<()> {
        self.tables
            .documents
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DbError::not_found("Document", id))
    }
}

impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> DbResult<Vec<Product>> {
        let products = self.tables.products.read().await;
        let mut list: Vec<Product> = products.values().cloned().collect();
        list.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        Ok(list)
    }

    async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        Ok(self.tables.products.read().await.get(id).cloned())
    }

    async fn save_product(&self, product: &Product) -> DbResult<Product> {
        check_product(product)?;
        let mut saved = product.clone();
        saved.updated_at = Utc::now();

        let mut products = self.tables.products.write().await;
        if let Some(existing) = products.get(&saved.id) {
            saved.created_at = existing.created_at;
        }
        products.insert(saved.id.clone(), saved.clone());
        Ok(saved)
    }

    async fn list_customers(&self) -> DbResult<Vec<Customer>> {
        let customers = self.tables.customers.read().await;
        let mut list: Vec<Customer> = customers.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn get_customer(&self, id: &str) -> DbResult<Option<Customer>> {
        Ok(self.tables.customers.read().await.get(id).cloned())
    }

    async fn save_customer(&self, customer: &Customer) -> DbResult<Customer> {
        check_customer(customer)?;
        self.tables
            .customers
            .write()
            .await
            .insert(customer.id.clone(), customer.clone());
        Ok(customer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use keystone_core::{CategoryScope, CustomerMarkupRule, DocumentKind, LineItem, Money};

    fn doc(id: &str, day: u32) -> Document {
        let date = NaiveDate::from_ymd_opt(2026, 4, day).unwrap();
        let mut doc = Document::new(id, DocumentKind::Order, &Customer::new("c-1", "Acme"), date);
        doc.line_items.push(LineItem::non_stock("li", "Work", 2, Money::from_cents(750)));
        doc
    }

    #[tokio::test]
    async fn test_save_recalculates() {
        let store = MemoryStore::new();
        let saved = store.save_document(&doc("ord-1", 1)).await.unwrap();
        assert_eq!(saved.total.cents(), 1500);
        assert_eq!(saved.balance_due.cents(), 1500);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.save_document(&doc("ord-1", 1)).await.unwrap();
        assert!(other.get_document("ord-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_listing_order_and_delete() {
        let store = MemoryStore::with_fixtures(vec![], vec![], vec![doc("ord-a", 1), doc("ord-b", 3)]);
        let ids: Vec<String> = store
            .list_documents(&DocumentFilter::all())
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["ord-b", "ord-a"]);

        store.delete_document("ord-a").await.unwrap();
        assert!(store.delete_document("ord-a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_catalog_round_trip() {
        let store = MemoryStore::new();
        store.save_product(&Product::new("p-2", "Post", "Fence", "each")).await.unwrap();
        store.save_product(&Product::new("p-1", "Bag of concrete", "Concrete", "bag")).await.unwrap();
        store.save_customer(&Customer::new("c-1", "Acme")).await.unwrap();

        let products = store.list_products().await.unwrap();
        assert_eq!(products[0].id, "p-1");
        assert!(store.get_customer("c-1").await.unwrap().is_some());
        assert!(store.get_product("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_catalog_records_are_not_stored() {
        let store = MemoryStore::new();

        let mut customer = Customer::new("c-1", "Acme");
        customer.markup_rules = vec![CustomerMarkupRule::new(CategoryScope::AllCategories, -100.0)];
        let err = store.save_customer(&customer).await.unwrap_err();
        assert!(matches!(err, DbError::Invalid { ref entity, .. } if entity == "Customer"));

        let mut product = Product::new("p-1", "Post", "Fence", "each");
        product.cost = Money::from_cents(-1);
        assert!(matches!(store.save_product(&product).await, Err(DbError::Invalid { .. })));

        assert!(store.list_customers().await.unwrap().is_empty());
        assert!(store.list_products().await.unwrap().is_empty());
    }
}
