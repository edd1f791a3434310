use rand::Rng;
use serde::{Deserialize, Serialize};

/// Bounds used when deriving variant prices from a product's base prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Sale price never drops below this
    #[serde(default = "default_min_sale_price")]
    pub min_sale_price: f64,

    /// Purchase price never drops below this
    #[serde(default = "default_min_purchase_price")]
    pub min_purchase_price: f64,

    /// Monthly price never drops below this
    #[serde(default = "default_min_monthly_price")]
    pub min_monthly_price: f64,

    /// Sale jitter is drawn from [-sale_jitter, +sale_jitter]
    #[serde(default = "default_sale_jitter")]
    pub sale_jitter: f64,

    /// Purchase jitter is drawn from [-purchase_jitter, +purchase_jitter]
    #[serde(default = "default_purchase_jitter")]
    pub purchase_jitter: f64,

    /// Monthly price moves by the sale jitter divided by this
    #[serde(default = "default_monthly_divisor")]
    pub monthly_divisor: f64,
}

fn default_min_sale_price() -> f64 { 10.0 }
fn default_min_purchase_price() -> f64 { 5.0 }
fn default_min_monthly_price() -> f64 { 1.0 }
fn default_sale_jitter() -> f64 { 25.0 }
fn default_purchase_jitter() -> f64 { 10.0 }
fn default_monthly_divisor() -> f64 { 10.0 }

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            min_sale_price: default_min_sale_price(),
            min_purchase_price: default_min_purchase_price(),
            min_monthly_price: default_min_monthly_price(),
            sale_jitter: default_sale_jitter(),
            purchase_jitter: default_purchase_jitter(),
            monthly_divisor: default_monthly_divisor(),
        }
    }
}

impl PricingConfig {
    /// Floors and jitter ranges must be finite and non-negative, the monthly
    /// divisor finite and positive.
    pub fn validate(&self) -> Result<(), PricingError> {
        let non_negative = [
            ("min_sale_price", self.min_sale_price),
            ("min_purchase_price", self.min_purchase_price),
            ("min_monthly_price", self.min_monthly_price),
            ("sale_jitter", self.sale_jitter),
            ("purchase_jitter", self.purchase_jitter),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PricingError::InvalidConfig { field, value });
            }
        }
        if !self.monthly_divisor.is_finite() || self.monthly_divisor <= 0.0 {
            return Err(PricingError::InvalidConfig {
                field: "monthly_divisor",
                value: self.monthly_divisor,
            });
        }
        Ok(())
    }
}

/// Base prices entered for a bulk generation. Both base prices are optional
/// here because they come straight from user input; see [`BasePrices::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasePrices {
    pub price: Option<f64>,
    pub purchase_price: Option<f64>,
    pub monthly_price: Option<f64>,
    pub stock: Option<i32>,
}

/// Base prices that passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedBase {
    pub price: f64,
    pub purchase_price: f64,
    pub monthly_price: Option<f64>,
    pub stock: Option<i32>,
}

impl BasePrices {
    pub fn validate(&self) -> Result<ValidatedBase, PricingError> {
        let price = require_positive("price", self.price)?;
        let purchase_price = require_positive("purchase_price", self.purchase_price)?;
        let monthly_price = match self.monthly_price {
            Some(_) => Some(require_positive("monthly_price", self.monthly_price)?),
            None => None,
        };
        if let Some(stock) = self.stock {
            if stock < 0 {
                return Err(PricingError::NegativeStock(stock));
            }
        }

        Ok(ValidatedBase {
            price,
            purchase_price,
            monthly_price,
            stock: self.stock,
        })
    }
}

fn require_positive(field: &'static str, value: Option<f64>) -> Result<f64, PricingError> {
    match value {
        None => Err(PricingError::Missing(field)),
        Some(v) if !v.is_finite() => Err(PricingError::NotNumeric(field)),
        Some(v) if v <= 0.0 => Err(PricingError::NotPositive { field, value: v }),
        Some(v) => Ok(v),
    }
}

/// Prices of one priced combination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantPrices {
    pub price: f64,
    pub purchase_price: f64,
    pub monthly_price: Option<f64>,
    pub stock: Option<i32>,
}

impl VariantPrices {
    /// Checks applied to manually entered prices
    pub fn validate(&self) -> Result<(), PricingError> {
        BasePrices {
            price: Some(self.price),
            purchase_price: Some(self.purchase_price),
            monthly_price: self.monthly_price,
            stock: self.stock,
        }
        .validate()
        .map(|_| ())
    }
}

/// A single random draw: `sale` is shared by sale and monthly price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    pub sale: f64,
    pub purchase: f64,
}

/// Derives per-variant prices by perturbing base prices
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Jitter {
        Jitter {
            sale: symmetric(rng, self.config.sale_jitter),
            purchase: symmetric(rng, self.config.purchase_jitter),
        }
    }

    /// Apply a draw to validated base prices, clamping to the floors and
    /// rounding to cents.
    pub fn apply(&self, base: &ValidatedBase, jitter: Jitter) -> VariantPrices {
        let price = round_cents((base.price + jitter.sale).max(self.config.min_sale_price));
        let purchase_price = round_cents(
            (base.purchase_price + jitter.purchase).max(self.config.min_purchase_price),
        );
        let monthly_price = base.monthly_price.map(|monthly| {
            let shift = jitter.sale / self.config.monthly_divisor;
            round_cents((monthly + shift).max(self.config.min_monthly_price))
        });

        VariantPrices {
            price,
            purchase_price,
            monthly_price,
            stock: base.stock,
        }
    }

    pub fn perturb<R: Rng + ?Sized>(&self, base: &ValidatedBase, rng: &mut R) -> VariantPrices {
        let jitter = self.draw(rng);
        self.apply(base, jitter)
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, spread: f64) -> f64 {
    if !spread.is_finite() || spread <= 0.0 {
        return 0.0;
    }
    rng.gen_range(-spread..=spread)
}

/// Round half away from zero to two decimals
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PricingError {
    #[error("Missing {0}")]
    Missing(&'static str),

    #[error("{0} is not a number")]
    NotNumeric(&'static str),

    #[error("{field} must be positive, got {value}")]
    NotPositive {
        field: &'static str,
        value: f64,
    },

    #[error("Stock must not be negative, got {0}")]
    NegativeStock(i32),

    #[error("Pricing setting {field} is out of range: {value}")]
    InvalidConfig {
        field: &'static str,
        value: f64,
    },
}
