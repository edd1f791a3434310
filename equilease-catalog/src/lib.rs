pub mod attributes;
pub mod combinations;
pub mod pricing;
pub mod product;
pub mod variant;

pub use attributes::{
    Attribute, AttributeSet, CatalogError, Combination, CombinationKey, DEFAULT_MAX_COMBINATIONS,
};
pub use combinations::enumerate;
pub use pricing::{BasePrices, PricingConfig, PricingEngine, PricingError, VariantPrices};
pub use product::CatalogProduct;
pub use variant::{ExistingCombinations, NewPricedCombination, PricedCombination};
