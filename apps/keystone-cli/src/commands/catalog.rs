//! # Catalog Commands
//!
//! Price lookup, and product / customer listings.

use keystone_core::pricing::{resolve_markup, resolve_unit_price, MarkupSource};
use keystone_core::{Customer, Product};
use keystone_db::CatalogStore;
use serde::Serialize;
use tracing::debug;

use super::{display, load_customer, load_product};
use crate::error::ApiError;
use crate::state::AppState;

/// A product's price for one customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub customer_id: Option<String>,
    pub cost_cents: i64,
    pub catalog_price_cents: i64,
    pub unit_price_cents: i64,
    pub unit_price_display: String,
    /// `None` when no customer rule applied and the catalog price was used.
    pub markup_percentage: Option<f64>,
    pub markup_source: Option<MarkupSource>,
}

pub async fn price<S: CatalogStore>(
    state: &AppState<S>,
    product_id: &str,
    customer_id: Option<&str>,
) -> Result<PriceResponse, ApiError> {
    debug!(product = %product_id, customer = ?customer_id, "price command");

    let product = load_product(&state.store, product_id).await?;
    let customer = match customer_id {
        Some(id) => Some(load_customer(&state.store, id).await?),
        None => None,
    };

    let unit_price = resolve_unit_price(&product, customer.as_ref());
    let rule = resolve_markup(customer.as_ref(), Some(&product.category));

    Ok(PriceResponse {
        product_id: product.id,
        product_name: product.name,
        category: product.category,
        customer_id: customer.map(|c| c.id),
        cost_cents: product.cost.cents(),
        catalog_price_cents: product.price.cents(),
        unit_price_cents: unit_price.cents(),
        unit_price_display: display(state, unit_price),
        markup_percentage: rule.map(|r| r.markup_percentage),
        markup_source: rule.map(|r| r.source),
    })
}

pub async fn products<S: CatalogStore>(state: &AppState<S>) -> Result<Vec<Product>, ApiError> {
    Ok(state.store.list_products().await?)
}

pub async fn customers<S: CatalogStore>(state: &AppState<S>) -> Result<Vec<Customer>, ApiError> {
    Ok(state.store.list_customers().await?)
}
