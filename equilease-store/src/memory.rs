use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use equilease_catalog::{
    AttributeSet, CatalogProduct, ExistingCombinations, NewPricedCombination, PricedCombination,
};
use equilease_core::{BucketProbe, ProductRepository, RepositoryError, RepositoryResult, VariantRepository};

/// In-process stand-in for the hosted database, used for local runs and tests.
/// Enforces the same case-insensitive uniqueness as the Postgres index.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<Uuid, CatalogProduct>>,
    variants: RwLock<Vec<PricedCombination>>,
    buckets: RwLock<HashSet<String>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_product(&self, product: CatalogProduct) {
        self.products.write().await.insert(product.id, product);
    }

    pub async fn add_bucket(&self, name: impl Into<String>) {
        self.buckets.write().await.insert(name.into());
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalog {
    async fn get_product(&self, id: Uuid) -> RepositoryResult<Option<CatalogProduct>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn update_attributes(
        &self,
        id: Uuid,
        attributes: &AttributeSet,
    ) -> RepositoryResult<CatalogProduct> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Product {}", id)))?;

        product.variation_attributes = Some(attributes.clone());
        product.updated_at = Utc::now();
        Ok(product.clone())
    }
}

#[async_trait]
impl VariantRepository for InMemoryCatalog {
    async fn list_variants(&self, product_id: Uuid) -> RepositoryResult<Vec<PricedCombination>> {
        Ok(self
            .variants
            .read()
            .await
            .iter()
            .filter(|v| v.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn create_variant(
        &self,
        variant: &NewPricedCombination,
    ) -> RepositoryResult<PricedCombination> {
        let mut variants = self.variants.write().await;

        let siblings = variants.iter().filter(|v| v.product_id == variant.product_id);
        if ExistingCombinations::from_priced(siblings).contains(&variant.attributes) {
            return Err(RepositoryError::Conflict(format!("Variant {}", variant.attributes)));
        }

        let stored = variant.clone().into_priced(Uuid::new_v4(), Utc::now());
        variants.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl BucketProbe for InMemoryCatalog {
    async fn bucket_exists(&self, name: &str) -> RepositoryResult<bool> {
        Ok(self.buckets.read().await.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equilease_catalog::{Combination, VariantPrices};

    #[tokio::test]
    async fn test_duplicate_variant_is_a_conflict() {
        let catalog = InMemoryCatalog::new();
        let product_id = Uuid::new_v4();
        let prices = VariantPrices {
            price: 50.0,
            purchase_price: 30.0,
            monthly_price: None,
            stock: Some(1),
        };

        let first = NewPricedCombination::new(
            product_id,
            Combination::new().with("color", "Black"),
            prices,
        );
        catalog.create_variant(&first).await.unwrap();

        let dup = NewPricedCombination::new(
            product_id,
            Combination::new().with("color", "black"),
            prices,
        );
        assert!(matches!(
            catalog.create_variant(&dup).await,
            Err(RepositoryError::Conflict(_))
        ));

        // same combination under another product is fine
        let other = NewPricedCombination::new(
            Uuid::new_v4(),
            Combination::new().with("color", "black"),
            prices,
        );
        assert!(catalog.create_variant(&other).await.is_ok());
        assert_eq!(catalog.list_variants(product_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_attributes_of_unknown_product() {
        let catalog = InMemoryCatalog::new();
        let result = catalog
            .update_attributes(Uuid::new_v4(), &AttributeSet::new())
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }
}
