use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::attributes::{Combination, CombinationKey};
use crate::pricing::VariantPrices;

/// A stored combination with its prices, owned by one catalog product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedCombination {
    pub id: Uuid,
    pub product_id: Uuid,
    pub attributes: Combination,
    pub price: f64,
    pub purchase_price: f64,
    pub monthly_price: Option<f64>,
    pub stock: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl PricedCombination {
    pub fn prices(&self) -> VariantPrices {
        VariantPrices {
            price: self.price,
            purchase_price: self.purchase_price,
            monthly_price: self.monthly_price,
            stock: self.stock,
        }
    }
}

/// Creation request for a priced combination; the store assigns id and timestamp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPricedCombination {
    pub product_id: Uuid,
    pub attributes: Combination,
    pub price: f64,
    pub purchase_price: f64,
    pub monthly_price: Option<f64>,
    pub stock: Option<i32>,
}

impl NewPricedCombination {
    pub fn new(product_id: Uuid, attributes: Combination, prices: VariantPrices) -> Self {
        Self {
            product_id,
            attributes,
            price: prices.price,
            purchase_price: prices.purchase_price,
            monthly_price: prices.monthly_price,
            stock: prices.stock,
        }
    }

    pub fn into_priced(self, id: Uuid, created_at: DateTime<Utc>) -> PricedCombination {
        PricedCombination {
            id,
            product_id: self.product_id,
            attributes: self.attributes,
            price: self.price,
            purchase_price: self.purchase_price,
            monthly_price: self.monthly_price,
            stock: self.stock,
            created_at,
        }
    }
}

/// Case-insensitive set of the combinations already present for a product
#[derive(Debug, Default)]
pub struct ExistingCombinations {
    keys: HashSet<CombinationKey>,
}

impl ExistingCombinations {
    pub fn from_priced<'a, I>(existing: I) -> Self
    where
        I: IntoIterator<Item = &'a PricedCombination>,
    {
        Self {
            keys: existing.into_iter().map(|p| p.attributes.key()).collect(),
        }
    }

    pub fn contains(&self, combination: &Combination) -> bool {
        self.keys.contains(&combination.key())
    }

    /// Record a combination; returns false when it was already known
    pub fn insert(&mut self, combination: &Combination) -> bool {
        self.keys.insert(combination.key())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priced(product_id: Uuid, combination: Combination) -> PricedCombination {
        NewPricedCombination::new(
            product_id,
            combination,
            VariantPrices {
                price: 100.0,
                purchase_price: 50.0,
                monthly_price: None,
                stock: None,
            },
        )
        .into_priced(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_existing_lookup_is_case_insensitive() {
        let product_id = Uuid::new_v4();
        let stored = vec![
            priced(product_id, Combination::new().with("color", "Red").with("size", "S")),
            priced(product_id, Combination::new().with("color", "Blue").with("size", "S")),
        ];
        let mut existing = ExistingCombinations::from_priced(&stored);

        assert_eq!(existing.len(), 2);
        assert!(existing.contains(&Combination::new().with("color", "RED").with("size", "s")));
        assert!(!existing.contains(&Combination::new().with("color", "Red").with("size", "M")));

        assert!(existing.insert(&Combination::new().with("color", "Red").with("size", "M")));
        assert!(!existing.insert(&Combination::new().with("color", "red").with("size", "m")));
    }
}
