use std::fmt;

use thiserror::Error;

/// One failing form field, reported inline next to the field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum TentlyError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Unknown member: {0}")]
    UnknownMember(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),

    #[error("Invalid page size: {0} (expected one of 5, 10, 20, 50, 100)")]
    InvalidPageSize(usize),

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("This file has already been imported: {0}")]
    DuplicateImport(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Not logged in. Run `tently login` first.")]
    NotAuthenticated,

    #[error("Invalid or expired verification code")]
    InvalidOtp,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TentlyError>;
