use thiserror::Error;

/// Failure kinds surfaced by the stores. Messages are shown to HTTP clients
/// verbatim, so they are written as complete sentences.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Persistence(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn read_failed(e: impl std::fmt::Display) -> Self {
        Self::Persistence(format!("Failed to read data: {}", e))
    }

    pub fn write_failed(e: impl std::fmt::Display) -> Self {
        Self::Persistence(format!("Failed to save data: {}", e))
    }
}
