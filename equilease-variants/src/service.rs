use std::sync::Arc;
use uuid::Uuid;

use equilease_catalog::{
    enumerate, AttributeSet, BasePrices, CatalogProduct, Combination, ExistingCombinations,
    NewPricedCombination, PricedCombination, VariantPrices, DEFAULT_MAX_COMBINATIONS,
};
use equilease_core::{CoreError, CoreResult, ProductRepository, VariantRepository};

use crate::generator::{GenerationError, VariantGenerator};
use crate::report::GenerationReport;

/// Variant operations for one catalog, backed by the product and variant repositories
pub struct VariantService {
    products: Arc<dyn ProductRepository>,
    variants: Arc<dyn VariantRepository>,
    generator: VariantGenerator,
    max_combinations: usize,
}

impl VariantService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        variants: Arc<dyn VariantRepository>,
        generator: VariantGenerator,
    ) -> Self {
        Self {
            products,
            variants,
            generator,
            max_combinations: DEFAULT_MAX_COMBINATIONS,
        }
    }

    pub fn with_max_combinations(mut self, max_combinations: usize) -> Self {
        self.max_combinations = max_combinations;
        self
    }

    /// Enumerate a set after checking it against the combination limit
    pub fn enumerate(&self, attributes: &AttributeSet) -> CoreResult<Vec<Combination>> {
        attributes
            .validate_with_limit(self.max_combinations)
            .map_err(|e| CoreError::ValidationError(e.to_string()))?;
        Ok(enumerate(attributes))
    }

    fn bounded_enumerate(&self, attributes: &AttributeSet) -> CoreResult<Vec<Combination>> {
        // sets stored before the limit changed are only size-checked
        attributes
            .check_size(self.max_combinations)
            .map_err(|e| CoreError::ValidationError(e.to_string()))?;
        Ok(enumerate(attributes))
    }

    async fn product(&self, product_id: Uuid) -> CoreResult<CatalogProduct> {
        self.products
            .get_product(product_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Product {}", product_id)))
    }

    /// Every combination of the product's attribute set, in enumeration order
    pub async fn combinations(&self, product_id: Uuid) -> CoreResult<Vec<Combination>> {
        let product = self.product(product_id).await?;
        self.bounded_enumerate(&product.attributes())
    }

    pub async fn list(&self, product_id: Uuid) -> CoreResult<Vec<PricedCombination>> {
        self.product(product_id).await?;
        Ok(self.variants.list_variants(product_id).await?)
    }

    /// Replace the product's attribute set after structural validation
    pub async fn set_attributes(
        &self,
        product_id: Uuid,
        attributes: AttributeSet,
    ) -> CoreResult<CatalogProduct> {
        attributes
            .validate_with_limit(self.max_combinations)
            .map_err(|e| CoreError::ValidationError(e.to_string()))?;
        self.product(product_id).await?;
        Ok(self.products.update_attributes(product_id, &attributes).await?)
    }

    /// Manual entry of one combination with explicit prices
    pub async fn create_single(
        &self,
        product_id: Uuid,
        combination: Combination,
        prices: VariantPrices,
    ) -> CoreResult<PricedCombination> {
        prices
            .validate()
            .map_err(|e| CoreError::ValidationError(e.to_string()))?;

        let product = self.product(product_id).await?;
        product
            .attributes()
            .admits(&combination)
            .map_err(|e| CoreError::ValidationError(e.to_string()))?;

        let existing = self.variants.list_variants(product_id).await?;
        if ExistingCombinations::from_priced(&existing).contains(&combination) {
            return Err(CoreError::Conflict(format!(
                "Combination {} for product {}",
                combination, product_id
            )));
        }

        let created = self
            .variants
            .create_variant(&NewPricedCombination::new(product_id, combination, prices))
            .await?;
        tracing::info!(%product_id, variant_id = %created.id, "Variant created");

        Ok(created)
    }

    /// Bulk generation of every combination the product does not have yet
    pub async fn generate(
        &self,
        product_id: Uuid,
        base: &BasePrices,
    ) -> CoreResult<GenerationReport> {
        // reject bad input before touching anything
        base.validate()
            .map_err(|e| CoreError::ValidationError(e.to_string()))?;

        let product = self.product(product_id).await?;
        let candidates = self.bounded_enumerate(&product.attributes())?;
        let existing = self.variants.list_variants(product_id).await?;

        self.generator
            .generate_missing(product_id, &existing, candidates, base, self.variants.as_ref())
            .await
            .map_err(|e: GenerationError| CoreError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use equilease_core::{RepositoryError, RepositoryResult};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCatalog {
        products: Mutex<Vec<CatalogProduct>>,
        variants: Mutex<Vec<PricedCombination>>,
    }

    #[async_trait]
    impl ProductRepository for FakeCatalog {
        async fn get_product(&self, id: Uuid) -> RepositoryResult<Option<CatalogProduct>> {
            Ok(self.products.lock().unwrap().iter().find(|p| p.id == id).cloned())
        }

        async fn update_attributes(
            &self,
            id: Uuid,
            attributes: &AttributeSet,
        ) -> RepositoryResult<CatalogProduct> {
            let mut products = self.products.lock().unwrap();
            let product = products
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| RepositoryError::NotFound(format!("Product {}", id)))?;
            product.variation_attributes = Some(attributes.clone());
            Ok(product.clone())
        }
    }

    #[async_trait]
    impl VariantRepository for FakeCatalog {
        async fn list_variants(&self, product_id: Uuid) -> RepositoryResult<Vec<PricedCombination>> {
            Ok(self
                .variants
                .lock()
                .unwrap()
                .iter()
                .filter(|v| v.product_id == product_id)
                .cloned()
                .collect())
        }

        async fn create_variant(
            &self,
            variant: &NewPricedCombination,
        ) -> RepositoryResult<PricedCombination> {
            let stored = variant.clone().into_priced(Uuid::new_v4(), Utc::now());
            self.variants.lock().unwrap().push(stored.clone());
            Ok(stored)
        }
    }

    fn service_with_laptop() -> (VariantService, Uuid) {
        let catalog = Arc::new(FakeCatalog::default());
        let laptop = CatalogProduct::new("MacBook Air").with_attributes(
            AttributeSet::new()
                .with("color", ["Silver", "Midnight"])
                .with("ram", ["8GB", "16GB"]),
        );
        let id = laptop.id;
        catalog.products.lock().unwrap().push(laptop);

        let service = VariantService::new(catalog.clone(), catalog, VariantGenerator::default());
        (service, id)
    }

    fn prices() -> VariantPrices {
        VariantPrices {
            price: 1299.0,
            purchase_price: 999.0,
            monthly_price: Some(39.9),
            stock: Some(2),
        }
    }

    #[tokio::test]
    async fn test_manual_entry_rejects_duplicates_case_insensitively() {
        let (service, id) = service_with_laptop();

        let first = Combination::new().with("color", "Silver").with("ram", "8GB");
        service.create_single(id, first, prices()).await.unwrap();

        let again = Combination::new().with("color", "SILVER").with("ram", "8gb");
        let err = service.create_single(id, again, prices()).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_manual_entry_validates_combination_and_prices() {
        let (service, id) = service_with_laptop();

        let partial = Combination::new().with("color", "Silver");
        let err = service.create_single(id, partial, prices()).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let bad_prices = VariantPrices {
            price: -1.0,
            ..prices()
        };
        let full = Combination::new().with("color", "Silver").with("ram", "8GB");
        let err = service.create_single(id, full, bad_prices).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_generate_fills_the_gaps() {
        let (service, id) = service_with_laptop();
        service
            .create_single(
                id,
                Combination::new().with("color", "midnight").with("ram", "16gb"),
                prices(),
            )
            .await
            .unwrap();

        let base = BasePrices {
            price: Some(1200.0),
            purchase_price: Some(900.0),
            monthly_price: Some(35.0),
            stock: None,
        };
        let report = service.generate(id, &base).await.unwrap();

        assert_eq!(report.considered, 4);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 3);
        assert_eq!(service.list(id).await.unwrap().len(), 4);
        assert!(report.variants.iter().all(|v| v.monthly_price.unwrap() >= 32.5));
    }

    #[tokio::test]
    async fn test_generate_rejects_missing_prices_and_unknown_products() {
        let (service, id) = service_with_laptop();

        let err = service.generate(id, &BasePrices::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(service.list(id).await.unwrap().is_empty());

        let base = BasePrices {
            price: Some(10.0),
            purchase_price: Some(5.0),
            ..Default::default()
        };
        let err = service.generate(Uuid::new_v4(), &base).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_set_attributes_validates() {
        let (service, id) = service_with_laptop();

        let bad = AttributeSet::new().with("color", Vec::<String>::new());
        assert!(matches!(
            service.set_attributes(id, bad).await,
            Err(CoreError::ValidationError(_))
        ));

        let good = AttributeSet::new().with("keyboard", ["AZERTY", "QWERTY"]);
        let product = service.set_attributes(id, good).await.unwrap();
        assert_eq!(product.attributes().combination_count(), Some(2));
        assert_eq!(service.combinations(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_combination_limit_guards_enumeration_and_generation() {
        let (service, id) = service_with_laptop();
        let service = service.with_max_combinations(3);

        let base = BasePrices {
            price: Some(1200.0),
            purchase_price: Some(900.0),
            ..Default::default()
        };
        // the stored set has 4 combinations
        assert!(matches!(
            service.combinations(id).await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            service.generate(id, &base).await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(service.list(id).await.unwrap().is_empty());

        let wide = AttributeSet::new()
            .with("color", ["Silver", "Midnight"])
            .with("ram", ["8GB", "16GB"]);
        assert!(matches!(
            service.set_attributes(id, wide.clone()).await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(service.enumerate(&wide).is_err());
        assert_eq!(
            service
                .enumerate(&AttributeSet::new().with("ram", ["8GB", "16GB", "32GB"]))
                .unwrap()
                .len(),
            3
        );
    }
}
