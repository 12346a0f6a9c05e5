//! # Product Repository
//!
//! Catalog storage. Money is stored as integer cents, markup as a REAL
//! percentage.

use chrono::{DateTime, Utc};
use keystone_core::{Money, Product};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::check_product;

/// Row shape of the `products` table.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    category: String,
    unit: String,
    cost_cents: i64,
    price_cents: i64,
    markup_percentage: f64,
    quantity_in_stock: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            category: row.category,
            unit: row.unit,
            cost: Money::from_cents(row.cost_cents),
            price: Money::from_cents(row.price_cents),
            markup_percentage: row.markup_percentage,
            quantity_in_stock: row.quantity_in_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, name, category, unit,
        cost_cents, price_cents, markup_percentage,
        quantity_in_stock, created_at, updated_at
    FROM products
"#;

/// Repository for catalog products.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let fence = repo.list_by_category("Fence").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product, ordered by category then name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} ORDER BY category, name"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE category = ?1 ORDER BY name"))
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts or replaces a product by id. `created_at` of an existing row
    /// is kept; `updated_at` is stamped now.
    pub async fn upsert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Saving product");
        check_product(product)?;

        let mut saved = product.clone();
        saved.updated_at = Utc::now();

        saved.created_at = sqlx::query_scalar(
            r#"
            INSERT INTO products (
                id, name, category, unit,
                cost_cents, price_cents, markup_percentage,
                quantity_in_stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                unit = excluded.unit,
                cost_cents = excluded.cost_cents,
                price_cents = excluded.price_cents,
                markup_percentage = excluded.markup_percentage,
                quantity_in_stock = excluded.quantity_in_stock,
                updated_at = excluded.updated_at
            RETURNING created_at
            "#,
        )
        .bind(&saved.id)
        .bind(&saved.name)
        .bind(&saved.category)
        .bind(&saved.unit)
        .bind(saved.cost.cents())
        .bind(saved.price.cents())
        .bind(saved.markup_percentage)
        .bind(saved.quantity_in_stock)
        .bind(saved.created_at)
        .bind(saved.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    /// Counts catalog products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> ProductRepository {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        db.products()
    }

    fn picket(id: &str, category: &str) -> Product {
        let mut product = Product::new(id, "Cedar picket", category, "each");
        product.cost = Money::from_cents(250);
        product.price = Money::from_cents(338);
        product.markup_percentage = 35.2;
        product
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let repo = setup().await;
        repo.upsert(&picket("p-1", "Fence")).await.unwrap();

        let loaded = repo.get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(loaded.cost.cents(), 250);
        assert_eq!(loaded.price.cents(), 338);
        assert_eq!(loaded.markup_percentage, 35.2);
        assert_eq!(loaded.quantity_in_stock, None);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let repo = setup().await;
        let mut product = repo.upsert(&picket("p-1", "Fence")).await.unwrap();
        product.price = Money::from_cents(400);
        product.quantity_in_stock = Some(12);
        repo.upsert(&product).await.unwrap();

        let mut rebuilt = picket("p-1", "Fence");
        rebuilt.price = Money::from_cents(400);
        rebuilt.quantity_in_stock = Some(12);
        let resaved = repo.upsert(&rebuilt).await.unwrap();
        assert_eq!(resaved.created_at, product.created_at);

        let loaded = repo.get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(loaded.created_at, product.created_at);
        assert_eq!(loaded.price.cents(), 400);
        assert_eq!(loaded.quantity_in_stock, Some(12));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let repo = setup().await;
        repo.upsert(&picket("p-1", "Fence")).await.unwrap();
        repo.upsert(&picket("p-2", "Lumber")).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 2);
        let fence = repo.list_by_category("Fence").await.unwrap();
        assert_eq!(fence.len(), 1);
        assert_eq!(fence[0].id, "p-1");
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_product() {
        let repo = setup().await;
        let mut product = picket("p-1", "Fence");
        product.cost = Money::from_cents(-250);
        product.category = String::new();

        match repo.upsert(&product).await.unwrap_err() {
            DbError::Invalid { entity, errors, .. } => {
                assert_eq!(entity, "Product");
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
