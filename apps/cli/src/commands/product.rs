//! # Product Commands
//!
//! Catalog maintenance and lookup.
//!
//! ## Lookup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Lookup Flow                                  │
//! │                                                                         │
//! │  Operator types "sugar" or scans "4790010000042"                       │
//! │       │                                                                 │
//! │       ├──► find_product()     one product: barcode, exact, partial     │
//! │       │                                                                 │
//! │       └──► suggest_products() ranked list for the dropdown             │
//! │                                                                         │
//! │  Both are read-only; stock only moves through the bill commands        │
//! │  and restock_product().                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::DbState;
use kade_core::search::DEFAULT_SUGGESTION_LIMIT;
use kade_core::{Money, Product, ProductDraft, Quantity, UnitType};

/// Fields to change on a product; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub price: Option<Money>,
    pub marked_price: Option<Money>,
    pub quantity: Option<Quantity>,
    pub unit_type: Option<UnitType>,
    pub unit_measure: Option<String>,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub description: Option<String>,
    pub reorder_level: Option<Quantity>,
}

impl ProductPatch {
    /// The stored product with this patch applied.
    ///
    /// Switching unit type without naming a measure resets the measure to
    /// the new type's default.
    fn apply(self, product: Product) -> ProductDraft {
        let unit_type = self.unit_type.unwrap_or(product.unit_type);
        let unit_measure = match (self.unit_measure, self.unit_type) {
            (Some(measure), _) => measure,
            (None, Some(_)) if unit_type != product.unit_type => String::new(),
            (None, _) => product.unit_measure.clone(),
        };

        ProductDraft {
            name: self.name.unwrap_or_else(|| product.name.clone()),
            barcode: self.barcode.unwrap_or_else(|| product.barcode.clone()),
            price: self.price.unwrap_or_else(|| product.price()),
            marked_price: self.marked_price.unwrap_or_else(|| product.marked_price()),
            quantity: self.quantity.unwrap_or_else(|| product.quantity()),
            unit_type,
            unit_measure,
            category: self.category.or_else(|| product.category.clone()),
            supplier: self.supplier.or_else(|| product.supplier.clone()),
            description: self.description.or_else(|| product.description.clone()),
            reorder_level: self.reorder_level.unwrap_or_else(|| product.reorder_level()),
        }
    }
}

/// Adds a product to the catalog.
pub async fn add_product(db: &DbState, draft: ProductDraft) -> ApiResult<Product> {
    let product = db.inner().products().insert(draft).await?;
    info!(barcode = %product.barcode, name = %product.name, "Product added");
    Ok(product)
}

/// Applies `patch` to product `id`.
pub async fn update_product(db: &DbState, id: i64, patch: ProductPatch) -> ApiResult<Product> {
    let products = db.inner().products();
    let current = products
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id.to_string()))?;

    let product = products.update(id, patch.apply(current)).await?;
    info!(id, barcode = %product.barcode, "Product updated");
    Ok(product)
}

pub async fn delete_product(db: &DbState, id: i64) -> ApiResult<()> {
    db.inner().products().delete(id).await?;
    info!(id, "Product deleted");
    Ok(())
}

/// Catalog browse: name, barcode or category contains `query`.
pub async fn search_products(db: &DbState, query: &str) -> ApiResult<Vec<Product>> {
    debug!(query = %query, "search_products command");
    Ok(db.inner().products().search(query).await?)
}

pub async fn low_stock_products(db: &DbState) -> ApiResult<Vec<Product>> {
    Ok(db.inner().products().low_stock().await?)
}

/// Resolves a query to exactly one product.
///
/// ## Returns
/// * `Ok(Product)` - best match by barcode, exact name, then partial name
/// * `Err(ApiError)` with `NOT_FOUND` - nothing matched
pub async fn find_product(db: &DbState, query: &str) -> ApiResult<Product> {
    db.inner()
        .products()
        .find(query)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", query.trim()))
}

/// Ranked name suggestions, capped at `limit` (default 10).
pub async fn suggest_products(
    db: &DbState,
    query: &str,
    limit: Option<i64>,
) -> ApiResult<Vec<Product>> {
    let limit = limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT).clamp(1, 50);
    Ok(db.inner().products().suggest(query, limit).await?)
}

/// Adds delivered stock to a product.
pub async fn restock_product(db: &DbState, barcode: &str, quantity: Quantity) -> ApiResult<Product> {
    let product = db.inner().products().restock(barcode, quantity).await?;
    info!(barcode = %product.barcode, added = %quantity, now = %product.quantity(), "Restocked");
    Ok(product)
}
