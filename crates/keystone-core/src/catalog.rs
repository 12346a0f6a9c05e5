//! # Catalog Promotion
//!
//! Turns non-stock lines flagged "add to product list" into catalog
//! products, and links the line to the product it became.
//!
//! ```text
//!   LineItem (non-stock, add_to_product_list)
//!        │
//!        ├──► Product { name, category ?? "Uncategorized", unit ?? "each",
//!        │              cost, price = unit_price, markup }
//!        │
//!        └──► LineItem { product_id = new id, is_non_stock = false,
//!                        add_to_product_list = false }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::pricing::derive_markup;
use crate::types::{Document, LineItem, Product};
use crate::{DEFAULT_UNIT, UNCATEGORIZED};

/// A promoted line: the new catalog product and the relinked line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Promotion {
    pub product: Product,
    pub line_item: LineItem,
}

/// Builds a product from a flagged non-stock line.
///
/// Returns `None` for catalog lines and for non-stock lines without the
/// flag. Markup is the stored line markup, or derived from cost and price
/// when the line never had one.
pub fn promote_to_catalog(item: &LineItem, product_id: impl Into<String>, now: DateTime<Utc>) -> Option<Promotion> {
    if !item.is_non_stock || !item.add_to_product_list {
        return None;
    }

    let product_id = product_id.into();
    let cost = item.cost.unwrap_or_default();
    let category = item
        .new_product_category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNCATEGORIZED);
    let unit = item
        .unit
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEFAULT_UNIT);

    let product = Product {
        id: product_id.clone(),
        name: item.product_name.trim().to_string(),
        category: category.to_string(),
        unit: unit.to_string(),
        cost,
        price: item.unit_price,
        markup_percentage: item
            .markup_percentage
            .unwrap_or_else(|| derive_markup(cost, item.unit_price)),
        quantity_in_stock: None,
        created_at: now,
        updated_at: now,
    };

    let mut line_item = item.clone();
    line_item.product_id = Some(product_id);
    line_item.is_non_stock = false;
    line_item.add_to_product_list = false;
    line_item.unit = Some(product.unit.clone());

    Some(Promotion { product, line_item })
}

/// Promotes every flagged line of `document`.
///
/// Returns the updated document (input untouched) and the new products in
/// line order. `next_id` is called once per promoted line.
pub fn promote_document(
    document: &Document,
    mut next_id: impl FnMut() -> String,
    now: DateTime<Utc>,
) -> (Document, Vec<Product>) {
    let mut updated = document.clone();
    let mut products = Vec::new();

    for item in updated.line_items.iter_mut() {
        if !(item.is_non_stock && item.add_to_product_list) {
            continue;
        }
        if let Some(promotion) = promote_to_catalog(item, next_id(), now) {
            *item = promotion.line_item;
            products.push(promotion.product);
        }
    }

    if !products.is_empty() {
        updated.updated_at = now;
    }
    (updated, products)
}
