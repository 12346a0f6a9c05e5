//! # Customer Repository
//!
//! Customer accounts. Markup rules are kept in a JSON column so a customer
//! and its rules are always read and written together.
//!
//! ```text
//!   markup_rules = [
//!     {"scope": {"scope": "category", "name": "Fence"}, "markup_percentage": 40.0},
//!     {"scope": {"scope": "all_categories"},           "markup_percentage": 25.0}
//!   ]
//! ```

use chrono::{DateTime, Utc};
use keystone_core::{Customer, CustomerMarkupRule};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::check_customer;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    markup_rules: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DbError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let markup_rules: Vec<CustomerMarkupRule> = serde_json::from_str(&row.markup_rules)?;
        Ok(Customer {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            markup_rules,
            created_at: row.created_at,
        })
    }
}

/// Repository for customers and their markup rules.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists customers by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(
            "SELECT id, name, email, phone, markup_rules, created_at FROM customers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Customer::try_from).collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT id, name, email, phone, markup_rules, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    /// Inserts or replaces a customer, rules included.
    pub async fn upsert(&self, customer: &Customer) -> DbResult<Customer> {
        debug!(id = %customer.id, rules = customer.markup_rules.len(), "Saving customer");
        check_customer(customer)?;

        let rules = serde_json::to_string(&customer.markup_rules)?;

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, markup_rules, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                phone = excluded.phone,
                markup_rules = excluded.markup_rules
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(rules)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(customer.clone())
    }
}
