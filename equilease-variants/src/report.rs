use serde::{Deserialize, Serialize};
use uuid::Uuid;
use equilease_catalog::{Combination, PricedCombination};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    /// Every candidate already existed (or there were none); nothing was attempted
    NothingToGenerate,
    Completed,
    CompletedWithFailures,
}

/// A combination whose creation failed, with the backend's reason
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreationFailure {
    pub combination: Combination,
    pub reason: String,
}

/// Summary of one bulk generation run.
///
/// `considered == skipped + created + failed` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub product_id: Uuid,
    pub status: GenerationStatus,
    pub considered: usize,
    pub skipped: usize,
    pub created: usize,
    pub failed: usize,
    pub variants: Vec<PricedCombination>,
    pub failures: Vec<CreationFailure>,
}

impl GenerationReport {
    pub fn nothing_to_generate(run_id: Uuid, product_id: Uuid, considered: usize) -> Self {
        Self {
            run_id,
            product_id,
            status: GenerationStatus::NothingToGenerate,
            considered,
            skipped: considered,
            created: 0,
            failed: 0,
            variants: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// One-line message for the caller's notification
    pub fn summary(&self) -> String {
        match self.status {
            GenerationStatus::NothingToGenerate if self.considered == 0 => {
                "No combinations to generate".to_string()
            }
            GenerationStatus::NothingToGenerate => {
                format!("All {} combinations already exist", self.considered)
            }
            GenerationStatus::Completed => {
                format!("{} variants created", self.created)
            }
            GenerationStatus::CompletedWithFailures => {
                format!("{} variants created, {} failed", self.created, self.failed)
            }
        }
    }
}
