//! Error types for Resilience

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The statement has no column that can be read as a transaction amount
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl Error {
    /// Whether this error was caused by the uploaded file rather than the server
    pub fn is_client_input(&self) -> bool {
        matches!(self, Error::Schema(_) | Error::Csv(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
