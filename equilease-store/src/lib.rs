pub mod app_config;
pub mod bucket_cache;
pub mod catalog_repo;
pub mod database;
pub mod memory;

pub use bucket_cache::BucketCache;
pub use catalog_repo::StoreCatalogRepository;
pub use database::DbClient;
pub use memory::InMemoryCatalog;
