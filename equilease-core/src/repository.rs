use async_trait::async_trait;
use uuid::Uuid;
use equilease_catalog::{AttributeSet, CatalogProduct, NewPricedCombination, PricedCombination};

/// Failures surfaced by persistence collaborators
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository trait for catalog products
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_product(
        &self,
        id: Uuid,
    ) -> RepositoryResult<Option<CatalogProduct>>;

    /// Replace the variation attributes stored on a product
    async fn update_attributes(
        &self,
        id: Uuid,
        attributes: &AttributeSet,
    ) -> RepositoryResult<CatalogProduct>;
}

/// Repository trait for priced combinations (product variants)
#[async_trait]
pub trait VariantRepository: Send + Sync {
    async fn list_variants(
        &self,
        product_id: Uuid,
    ) -> RepositoryResult<Vec<PricedCombination>>;

    async fn create_variant(
        &self,
        variant: &NewPricedCombination,
    ) -> RepositoryResult<PricedCombination>;
}
