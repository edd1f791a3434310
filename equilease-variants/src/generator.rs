use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use equilease_catalog::pricing::ValidatedBase;
use equilease_catalog::{
    BasePrices, Combination, ExistingCombinations, NewPricedCombination, PricedCombination,
    PricingEngine, PricingError,
};
use equilease_core::VariantRepository;
use equilease_shared::models::events::{
    GenerationEvent, ItemOutcome, VariantProgressEvent, VariantsGeneratedEvent,
};

use crate::events::ProgressPublisher;
use crate::report::{CreationFailure, GenerationReport, GenerationStatus};

/// Default cap on concurrent creation requests per run
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Priced creation requests for the combinations that do not exist yet
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub run_id: Uuid,
    pub product_id: Uuid,
    pub considered: usize,
    pub skipped: usize,
    pub requests: Vec<NewPricedCombination>,
}

impl GenerationPlan {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Creates the missing priced combinations of a product
pub struct VariantGenerator {
    pricing_engine: PricingEngine,
    max_in_flight: usize,
    publisher: ProgressPublisher,
}

impl VariantGenerator {
    pub fn new(pricing_engine: PricingEngine) -> Self {
        Self {
            pricing_engine,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            publisher: ProgressPublisher::disabled(),
        }
    }

    /// Cap on outstanding creation requests; 1 issues them strictly one after another
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn with_publisher(mut self, publisher: ProgressPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Filter out existing combinations and price the rest.
    ///
    /// Pure apart from the random draws, so a seeded `rng` makes it deterministic.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        product_id: Uuid,
        existing: &[PricedCombination],
        candidates: Vec<Combination>,
        base: &ValidatedBase,
        rng: &mut R,
    ) -> GenerationPlan {
        let considered = candidates.len();
        let mut known = ExistingCombinations::from_priced(existing);
        let mut requests = Vec::new();

        for combination in candidates {
            // also collapses duplicates inside the candidate list
            if !known.insert(&combination) {
                continue;
            }
            let prices = self.pricing_engine.perturb(base, rng);
            requests.push(NewPricedCombination::new(product_id, combination, prices));
        }

        GenerationPlan {
            run_id: Uuid::new_v4(),
            product_id,
            considered,
            skipped: considered - requests.len(),
            requests,
        }
    }

    /// Issue the planned creations, at most `max_in_flight` at a time.
    ///
    /// A failed creation is recorded and the run carries on. Results are
    /// reported in plan order.
    pub async fn execute(
        &self,
        plan: GenerationPlan,
        repo: &dyn VariantRepository,
    ) -> GenerationReport {
        let GenerationPlan {
            run_id,
            product_id,
            considered,
            skipped,
            requests,
        } = plan;

        if requests.is_empty() {
            tracing::info!(%product_id, considered, "Nothing to generate");
            let report = GenerationReport::nothing_to_generate(run_id, product_id, considered);
            self.publish_completed(&report);
            return report;
        }

        let total = requests.len();
        tracing::info!(
            %run_id,
            %product_id,
            considered,
            skipped,
            to_create = total,
            max_in_flight = self.max_in_flight,
            "Generating variants"
        );

        let mut results = stream::iter(requests.into_iter().enumerate())
            .map(|(index, request)| async move {
                let result = repo.create_variant(&request).await;
                (index, request, result)
            })
            .buffered(self.max_in_flight);

        let mut variants = Vec::with_capacity(total);
        let mut failures = Vec::new();

        while let Some((index, request, result)) = results.next().await {
            let outcome = match result {
                Ok(variant) => {
                    variants.push(variant);
                    ItemOutcome::Created
                }
                Err(e) => {
                    tracing::warn!(
                        %run_id,
                        combination = %request.attributes,
                        "Variant creation failed: {}",
                        e
                    );
                    failures.push(CreationFailure {
                        combination: request.attributes.clone(),
                        reason: e.to_string(),
                    });
                    ItemOutcome::Failed
                }
            };

            self.publisher.publish(GenerationEvent::Progress(VariantProgressEvent {
                run_id,
                product_id,
                index,
                total,
                outcome,
                combination: serde_json::to_value(&request.attributes)
                    .unwrap_or(serde_json::Value::Null),
                timestamp: Utc::now().timestamp(),
            }));
        }

        let status = if failures.is_empty() {
            GenerationStatus::Completed
        } else {
            GenerationStatus::CompletedWithFailures
        };

        let report = GenerationReport {
            run_id,
            product_id,
            status,
            considered,
            skipped,
            created: variants.len(),
            failed: failures.len(),
            variants,
            failures,
        };

        tracing::info!(
            %run_id,
            %product_id,
            created = report.created,
            failed = report.failed,
            "Variant generation finished"
        );
        self.publish_completed(&report);

        report
    }

    /// Validate base prices, plan with a fresh RNG and execute.
    pub async fn generate_missing(
        &self,
        product_id: Uuid,
        existing: &[PricedCombination],
        candidates: Vec<Combination>,
        base: &BasePrices,
        repo: &dyn VariantRepository,
    ) -> Result<GenerationReport, GenerationError> {
        let base = base.validate()?;
        let mut rng = StdRng::from_entropy();
        let plan = self.plan(product_id, existing, candidates, &base, &mut rng);
        Ok(self.execute(plan, repo).await)
    }

    fn publish_completed(&self, report: &GenerationReport) {
        self.publisher.publish(GenerationEvent::Completed(VariantsGeneratedEvent {
            run_id: report.run_id,
            product_id: report.product_id,
            considered: report.considered,
            skipped: report.skipped,
            created: report.created,
            failed: report.failed,
            timestamp: Utc::now().timestamp(),
        }));
    }
}

impl Default for VariantGenerator {
    fn default() -> Self {
        Self::new(PricingEngine::default())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GenerationError {
    #[error("Invalid base prices: {0}")]
    InvalidPrices(#[from] PricingError),
}
