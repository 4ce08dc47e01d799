//! Catalog read service
//!
//! Stand-in read paths for the external catalog and store reference
//! data. This subsystem never writes to either; the `variants` table is
//! the local projection of the catalog service.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{Store, Variant, SEARCH_RESULT_LIMIT};

/// Read-only access to stores and catalog variants
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct StoreRow {
    id: Uuid,
    code: String,
    name: String,
}

#[derive(Debug, FromRow)]
struct VariantRow {
    id: Uuid,
    sku: String,
    barcode: Option<String>,
    product_name: String,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Variant {
            id: row.id,
            sku: row.sku,
            barcode: row.barcode,
            product_name: row.product_name,
        }
    }
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List the tenant's stores
    pub async fn list_stores(&self, tenant_id: Uuid) -> AppResult<Vec<Store>> {
        let rows = sqlx::query_as::<_, StoreRow>(
            "SELECT id, code, name FROM stores WHERE tenant_id = $1 ORDER BY code",
        )
        .bind(tenant_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Store {
                id: r.id,
                code: r.code,
                name: r.name,
            })
            .collect())
    }

    /// Free-text variant search over SKU, product name, and exact
    /// barcode. Bounded; an empty query returns nothing.
    pub async fn search_variants(
        &self,
        tenant_id: Uuid,
        query: &str,
        store_id: Option<Uuid>,
        limit: Option<u32>,
    ) -> AppResult<Vec<Variant>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        // The store scope only guards tenancy today; assortment-level
        // filtering belongs to the catalog service.
        if let Some(store_id) = store_id {
            let store_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1 AND tenant_id = $2)",
            )
            .bind(store_id)
            .bind(tenant_id)
            .fetch_one(&self.db)
            .await?;

            if !store_exists {
                return Err(AppError::NotFound("Store".to_string()));
            }
        }

        let limit = i64::from(limit.unwrap_or(SEARCH_RESULT_LIMIT).min(SEARCH_RESULT_LIMIT));

        let rows = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, sku, barcode, product_name
            FROM variants
            WHERE tenant_id = $1
              AND (sku ILIKE '%' || $2 || '%'
                   OR product_name ILIKE '%' || $2 || '%'
                   OR barcode = $2)
            ORDER BY sku
            LIMIT $3
            "#,
        )
        .bind(tenant_id)
        .bind(query)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Variant::from).collect())
    }
}
