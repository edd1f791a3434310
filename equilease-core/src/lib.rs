pub mod repository;
pub mod storage;

pub use repository::{ProductRepository, RepositoryError, RepositoryResult, VariantRepository};
pub use storage::BucketProbe;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => CoreError::NotFound(what),
            RepositoryError::Conflict(what) => CoreError::Conflict(what),
            RepositoryError::Backend(msg) => CoreError::InternalError(msg),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
