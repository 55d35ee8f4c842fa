use std::io;

use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Submission error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Remote account reader errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Horizon answered 404: the account was never funded
    #[error("account {0} not found")]
    NotFound(String),

    #[error("invalid account id: {0:?}")]
    InvalidAccountId(String),

    #[error("{0}")]
    Network(String),
}

/// Transaction submission errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The network processed the transaction and refused it
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Transport(String),
}

/// Malformed input, caught before anything reaches the network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid destination public key: {0}")]
    InvalidDestination(String),

    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(String),

    #[error("Amount {0} has more than 7 decimal places")]
    AmountPrecision(String),

    #[error("Amount {0} does not fit in a native payment")]
    AmountOverflow(String),

    #[error("Memo is {len} bytes, limit is {max}")]
    MemoTooLong { len: usize, max: usize },

    #[error("Invalid amount format: {0}")]
    InvalidAmount(String),

    #[error("Invalid secret key")]
    InvalidSecretKey,
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<stellar_xdr::curr::Error> for AppError {
    fn from(error: stellar_xdr::curr::Error) -> Self {
        AppError::Encoding(format!("XDR error: {:?}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Encoding(format!("JSON error: {:?}", error))
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(error: reqwest::Error) -> Self {
        LedgerError::Network(format!("HTTP request error: {}", error))
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SubmitError::Transport(format!("request timed out: {}", error))
        } else {
            SubmitError::Transport(format!("HTTP request error: {}", error))
        }
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
