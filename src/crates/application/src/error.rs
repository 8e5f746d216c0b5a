use domain::DomainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    #[error("Page {page} failed {attempts} times in a row")]
    RetriesExhausted { page: u32, attempts: u32 },
    #[error("Unknown error: {0}")]
    UnknownError(String),
}
