pub mod events;
pub mod generator;
pub mod report;
pub mod service;

pub use events::ProgressPublisher;
pub use generator::{GenerationError, GenerationPlan, VariantGenerator};
pub use report::{CreationFailure, GenerationReport, GenerationStatus};
pub use service::VariantService;
