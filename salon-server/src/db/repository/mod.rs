//! Repository Module
//!
//! Free functions over a SQLite connection. Every query is tenant-scoped;
//! callers pass `&mut *tx` to run inside a transaction or a pooled
//! connection for standalone reads.

pub mod appointment;
pub mod customer;
pub mod payment;
pub mod service;
pub mod shop;
pub mod staff;

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::Duplicate(db_err.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<shared::models::UnknownVariant> for RepoError {
    fn from(err: shared::models::UnknownVariant) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Decode a decimal stored as TEXT
pub(crate) fn parse_decimal(raw: &str, column: &str) -> RepoResult<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| RepoError::Database(format!("Invalid decimal in {column}: {raw} ({e})")))
}

/// Decode an instant stored as UTC millis
pub(crate) fn parse_instant(ms: i64, column: &str) -> RepoResult<chrono::DateTime<chrono::Utc>> {
    crate::utils::time::from_millis(ms)
        .ok_or_else(|| RepoError::Database(format!("Invalid timestamp in {column}: {ms}")))
}
