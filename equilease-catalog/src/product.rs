use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attributes::AttributeSet;

/// Catalog item (leasable equipment) as far as variant generation cares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    /// Variation attributes; products without variants have none
    #[serde(default)]
    pub variation_attributes: Option<AttributeSet>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogProduct {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            brand: None,
            variation_attributes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeSet) -> Self {
        self.variation_attributes = Some(attributes);
        self
    }

    /// The product's attribute set, empty when none is defined
    pub fn attributes(&self) -> AttributeSet {
        self.variation_attributes.clone().unwrap_or_default()
    }
}
