//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Lookup: resolve a typed query to one product
//! - Suggestions: ranked name matches while typing
//! - CRUD with barcode uniqueness checked before writing
//! - Stock reservation and restoration for the open bill
//!
//! ## Lookup Tiers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Lookup Resolves "sugar"                          │
//! │                                                                         │
//! │   1. barcode = 'sugar'                  ← scanner input                 │
//! │   2. name    = 'sugar' (any case)       ← typed exactly                 │
//! │   3. name LIKE '%sugar%'                ← first partial hit by name     │
//! │                                                                         │
//! │   Single query: WHERE any tier matches                                  │
//! │                 ORDER BY CASE tier, name  LIMIT 1                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;
use kade_core::search::escape_like;
use kade_core::{CoreError, Product, ProductDraft, Quantity, ValidationError};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let hit = repo.find("4792024011234").await?;
/// let suggestions = repo.suggest("ric", 8).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a product by its row id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by exact barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE barcode = ?1")
            .bind(barcode.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Resolves a typed query to a single product.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - best match by barcode, exact name, then partial name
    /// * `Ok(None)` - nothing matched or the query is blank
    pub async fn find(&self, query: &str) -> DbResult<Option<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        debug!(query = %query, "Looking up product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE barcode = ?1
               OR name = ?1 COLLATE NOCASE
               OR name LIKE ?2 ESCAPE '\'
            ORDER BY
                CASE
                    WHEN barcode = ?1 THEN 1
                    WHEN name = ?1 COLLATE NOCASE THEN 2
                    ELSE 3
                END,
                name
            LIMIT 1
            "#,
        )
        .bind(query)
        .bind(contains_pattern(query))
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products whose name contains `query`, ranked for a
    /// suggestion dropdown.
    ///
    /// ## Ranking
    /// 1. name equals the query (any case)
    /// 2. name starts with the query
    /// 3. name contains the query elsewhere
    ///
    /// Ties are broken alphabetically. A blank query suggests nothing.
    pub async fn suggest(&self, query: &str, limit: i64) -> DbResult<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE name LIKE ?2 ESCAPE '\'
            ORDER BY
                CASE
                    WHEN name = ?1 COLLATE NOCASE THEN 1
                    WHEN name LIKE ?3 ESCAPE '\' THEN 2
                    ELSE 3
                END,
                name
            LIMIT ?4
            "#,
        )
        .bind(query)
        .bind(contains_pattern(query))
        .bind(format!("{}%", escape_like(query)))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(query = %query, count = products.len(), "Suggestions");
        Ok(products)
    }

    /// Every product, sorted by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Catalog browse filter over name, barcode and category, sorted by name.
    /// A blank query lists everything.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_all().await;
        }

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE name LIKE ?1 ESCAPE '\'
               OR barcode LIKE ?1 ESCAPE '\'
               OR category LIKE ?1 ESCAPE '\'
            ORDER BY name
            "#,
        )
        .bind(contains_pattern(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products at or below their reorder level, emptiest first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE quantity_milli <= reorder_level_milli
            ORDER BY quantity_milli, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts total products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - the stored row
    /// * `Err(DbError::UniqueViolation)` - barcode already in the catalog
    pub async fn insert(&self, draft: ProductDraft) -> DbResult<Product> {
        let draft = draft.validated()?;

        if self.get_by_barcode(&draft.barcode).await?.is_some() {
            return Err(DbError::duplicate("barcode", draft.barcode));
        }

        debug!(barcode = %draft.barcode, "Inserting product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, barcode, price_cents, marked_price_cents,
                quantity_milli, unit_type, unit_measure,
                category, supplier, description, reorder_level_milli,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.barcode)
        .bind(draft.price.cents())
        .bind(draft.marked_price.cents())
        .bind(draft.quantity.milli())
        .bind(draft.unit_type)
        .bind(&draft.unit_measure)
        .bind(&draft.category)
        .bind(&draft.supplier)
        .bind(&draft.description)
        .bind(draft.reorder_level.milli())
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.require(result.last_insert_rowid()).await
    }

    /// Replaces every editable field of a product.
    ///
    /// Changing the barcode to one another product already uses is rejected.
    pub async fn update(&self, id: i64, draft: ProductDraft) -> DbResult<Product> {
        let draft = draft.validated()?;

        if let Some(other) = self.get_by_barcode(&draft.barcode).await? {
            if other.id != id {
                return Err(DbError::duplicate("barcode", draft.barcode));
            }
        }

        debug!(id = id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                barcode = ?3,
                price_cents = ?4,
                marked_price_cents = ?5,
                quantity_milli = ?6,
                unit_type = ?7,
                unit_measure = ?8,
                category = ?9,
                supplier = ?10,
                description = ?11,
                reorder_level_milli = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.barcode)
        .bind(draft.price.cents())
        .bind(draft.marked_price.cents())
        .bind(draft.quantity.milli())
        .bind(draft.unit_type)
        .bind(&draft.unit_measure)
        .bind(&draft.category)
        .bind(&draft.supplier)
        .bind(&draft.description)
        .bind(draft.reorder_level.milli())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id.to_string()));
        }

        self.require(id).await
    }

    /// Deletes a product permanently.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id.to_string()));
        }

        Ok(())
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Takes stock out for a bill line.
    ///
    /// The update is guarded so stock never goes below zero; if another
    /// writer got there first the call fails with `InsufficientStock`.
    pub async fn reserve_stock(&self, barcode: &str, qty: Quantity) -> DbResult<()> {
        if !qty.is_positive() {
            return Ok(());
        }

        debug!(barcode = %barcode, qty = %qty, "Reserving stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_milli = quantity_milli - ?2,
                updated_at = ?3
            WHERE barcode = ?1 AND quantity_milli >= ?2
            "#,
        )
        .bind(barcode)
        .bind(qty.milli())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let product = self
                .get_by_barcode(barcode)
                .await?
                .ok_or_else(|| DbError::not_found("Product", barcode))?;
            return Err(CoreError::InsufficientStock {
                available: product.quantity(),
                product: product.name,
                requested: qty,
            }
            .into());
        }

        Ok(())
    }

    /// Hands reserved stock back when a bill line is dropped.
    ///
    /// A product deleted while the bill was open is skipped with a warning.
    pub async fn restore_stock(&self, barcode: &str, qty: Quantity) -> DbResult<()> {
        if !qty.is_positive() {
            return Ok(());
        }

        debug!(barcode = %barcode, qty = %qty, "Restoring stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_milli = quantity_milli + ?2,
                updated_at = ?3
            WHERE barcode = ?1
            "#,
        )
        .bind(barcode)
        .bind(qty.milli())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(barcode = %barcode, "Product vanished before its stock could be restored");
        }

        Ok(())
    }

    /// Adds delivered stock to a product.
    pub async fn restock(&self, barcode: &str, qty: Quantity) -> DbResult<Product> {
        if !qty.is_positive() {
            return Err(ValidationError::must_be_positive("quantity").into());
        }

        let product = self
            .get_by_barcode(barcode)
            .await?
            .ok_or_else(|| DbError::not_found("Product", barcode))?;

        self.restore_stock(&product.barcode, qty).await?;
        self.require(product.id).await
    }

    async fn require(&self, id: i64) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
