use serde::Deserialize;
use std::env;
use equilease_catalog::{PricingConfig, DEFAULT_MAX_COMBINATIONS};
use equilease_shared::Masked;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Unset means the in-memory store is used
    pub url: Option<Masked<String>>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout_secs() -> u64 { 3 }
fn default_true() -> bool { true }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            run_migrations: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Outstanding creation requests per bulk run
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Largest attribute set expansion accepted by enumeration and bulk runs
    #[serde(default = "default_max_combinations")]
    pub max_combinations: usize,
}

fn default_max_in_flight() -> usize { 4 }
fn default_event_buffer() -> usize { 100 }
fn default_max_combinations() -> usize { DEFAULT_MAX_COMBINATIONS }

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            pricing: PricingConfig::default(),
            event_buffer: default_event_buffer(),
            max_combinations: default_max_combinations(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Bucket holding product pictures and generated documents
    #[serde(default = "default_bucket")]
    pub default_bucket: String,
}

fn default_bucket() -> String { "product-images".to_string() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { default_bucket: default_bucket() }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. EQUILEASE_DATABASE__URL=postgres://...
            .add_source(config::Environment::with_prefix("EQUILEASE").separator("__"))
            .build()?;

        let cfg: Self = s.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.generation
            .pricing
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(
                "[server]\nport = 8080\n\n[generation]\nmax_in_flight = 2\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let cfg: Config = cfg.try_deserialize().unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.database.url.is_none());
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.generation.max_in_flight, 2);
        assert_eq!(cfg.generation.pricing.min_sale_price, 10.0);
        assert_eq!(cfg.generation.max_combinations, 10_000);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.storage.default_bucket, "product-images");
    }

    #[test]
    fn test_out_of_range_pricing_is_rejected() {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(
                "[server]\nport = 1\n\n[generation.pricing]\nmonthly_divisor = 0.0\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let cfg: Config = cfg.try_deserialize().unwrap();

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("monthly_divisor"));
    }

    #[test]
    fn test_database_url_is_masked_in_debug() {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(
                "[server]\nport = 1\n\n[database]\nurl = \"postgres://app:secret@db/equilease\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let cfg: Config = cfg.try_deserialize().unwrap();

        assert!(!format!("{:?}", cfg).contains("secret"));
        assert!(cfg.database.url.unwrap().expose().contains("secret"));
    }
}
