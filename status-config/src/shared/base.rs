use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The replay input file is not usable.
    #[error("Invalid replay input: {0}")]
    InvalidInput(String),
}
