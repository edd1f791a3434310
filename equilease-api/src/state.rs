use std::sync::Arc;
use tokio::sync::broadcast;

use equilease_catalog::PricingEngine;
use equilease_core::{BucketProbe, ProductRepository, VariantRepository};
use equilease_store::app_config::GenerationConfig;
use equilease_store::BucketCache;
use equilease_variants::{ProgressPublisher, VariantGenerator, VariantService};

#[derive(Clone)]
pub struct AppState {
    pub variants: Arc<VariantService>,
    pub buckets: Arc<BucketCache>,
    pub events: ProgressPublisher,
    pub default_bucket: String,
}

impl AppState {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        variants: Arc<dyn VariantRepository>,
        probe: Arc<dyn BucketProbe>,
        generation: &GenerationConfig,
        default_bucket: impl Into<String>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(generation.event_buffer.max(1));
        let events = ProgressPublisher::new(events_tx);

        let generator = VariantGenerator::new(PricingEngine::new(generation.pricing.clone()))
            .with_max_in_flight(generation.max_in_flight)
            .with_publisher(events.clone());

        Self {
            variants: Arc::new(
                VariantService::new(products, variants, generator)
                    .with_max_combinations(generation.max_combinations),
            ),
            buckets: Arc::new(BucketCache::new(probe)),
            events,
            default_bucket: default_bucket.into(),
        }
    }
}
