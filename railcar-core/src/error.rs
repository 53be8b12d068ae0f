//! Custom error types

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("`SerdeAPI::init` failed: {0}")]
    InitError(String),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Invalid train composition: {0}")]
    CompositionError(String),
}
