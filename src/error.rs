use thiserror::Error;

/// Errors surfaced by the storage, settings and export layers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid timestamp in stored record: {0}")]
    Timestamp(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Form-level input errors, always shown inline next to the field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Sensitivity must be a positive number")]
    InvalidSensitivity,

    #[error("DPI must be a positive whole number")]
    InvalidDpi,
}
