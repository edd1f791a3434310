use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use equilease_catalog::{AttributeSet, CatalogProduct, Combination, NewPricedCombination, PricedCombination};
use equilease_core::{BucketProbe, ProductRepository, RepositoryError, RepositoryResult, VariantRepository};

/// Postgres-backed products, variant prices and storage buckets
pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    brand: Option<String>,
    variation_attributes: Option<Json<AttributeSet>>,
    is_active: Option<bool>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for CatalogProduct {
    fn from(row: ProductRow) -> Self {
        CatalogProduct {
            id: row.id,
            name: row.name,
            brand: row.brand,
            variation_attributes: row.variation_attributes.map(|Json(set)| set),
            is_active: row.is_active.unwrap_or(true),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VariantRow {
    id: Uuid,
    product_id: Uuid,
    attributes: Json<Combination>,
    price: f64,
    purchase_price: f64,
    monthly_price: Option<f64>,
    stock: Option<i32>,
    created_at: DateTime<Utc>,
}

impl From<VariantRow> for PricedCombination {
    fn from(row: VariantRow) -> Self {
        PricedCombination {
            id: row.id,
            product_id: row.product_id,
            attributes: row.attributes.0,
            price: row.price,
            purchase_price: row.purchase_price,
            monthly_price: row.monthly_price,
            stock: row.stock,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, brand, variation_attributes, is_active, created_at, updated_at";

const VARIANT_COLUMNS: &str =
    "id, product_id, attributes, price, purchase_price, monthly_price, stock, created_at";

fn map_db_error(context: &str, err: sqlx::Error) -> RepositoryError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(context.to_string());
        }
    }
    tracing::error!("{} failed: {}", context, err);
    RepositoryError::Backend(err.to_string())
}

#[async_trait]
impl ProductRepository for StoreCatalogRepository {
    async fn get_product(
        &self,
        id: Uuid,
    ) -> RepositoryResult<Option<CatalogProduct>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Product lookup", e))?;

        Ok(row.map(CatalogProduct::from))
    }

    async fn update_attributes(
        &self,
        id: Uuid,
        attributes: &AttributeSet,
    ) -> RepositoryResult<CatalogProduct> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET variation_attributes = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(Json(attributes))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Product attribute update", e))?;

        row.map(CatalogProduct::from)
            .ok_or_else(|| RepositoryError::NotFound(format!("Product {}", id)))
    }
}

#[async_trait]
impl VariantRepository for StoreCatalogRepository {
    async fn list_variants(
        &self,
        product_id: Uuid,
    ) -> RepositoryResult<Vec<PricedCombination>> {
        let rows = sqlx::query_as::<_, VariantRow>(&format!(
            "SELECT {} FROM product_variant_prices WHERE product_id = $1 ORDER BY created_at, id",
            VARIANT_COLUMNS
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Variant listing", e))?;

        Ok(rows.into_iter().map(PricedCombination::from).collect())
    }

    async fn create_variant(
        &self,
        variant: &NewPricedCombination,
    ) -> RepositoryResult<PricedCombination> {
        // the unique index on (product_id, combination_key) rejects
        // case-insensitive duplicates
        let row = sqlx::query_as::<_, VariantRow>(&format!(
            r#"
            INSERT INTO product_variant_prices (id, product_id, attributes, combination_key, price, purchase_price, monthly_price, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            VARIANT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(variant.product_id)
        .bind(Json(&variant.attributes))
        .bind(variant.attributes.key().to_storage_key())
        .bind(variant.price)
        .bind(variant.purchase_price)
        .bind(variant.monthly_price)
        .bind(variant.stock)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(&format!("Variant {}", variant.attributes), e))?;

        Ok(row.into())
    }
}

#[async_trait]
impl BucketProbe for StoreCatalogRepository {
    async fn bucket_exists(&self, name: &str) -> RepositoryResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM storage.buckets WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("Bucket lookup", e))
    }
}
