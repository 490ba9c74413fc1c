//! Scheduling error taxonomy
//!
//! Five stable kinds reach callers: validation, not_found, conflict,
//! authorization and persistence. Each carries an [`ErrorCode`] for the
//! HTTP layer and a human-readable message.

use crate::db::repository::RepoError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SchedulingError {
    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    #[error("{message}")]
    NotFound { code: ErrorCode, message: String },

    #[error("{message}")]
    Conflict { code: ErrorCode, message: String },

    #[error("{message}")]
    Authorization { code: ErrorCode, message: String },

    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;

impl SchedulingError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    /// The staff member already has a non-cancelled appointment in the slot
    pub fn slot_taken() -> Self {
        Self::Conflict {
            code: ErrorCode::AppointmentConflict,
            message: ErrorCode::AppointmentConflict.message().to_string(),
        }
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Authorization {
            code,
            message: message.into(),
        }
    }

    pub fn appointment_not_found(id: i64) -> Self {
        Self::not_found(
            ErrorCode::AppointmentNotFound,
            format!("Appointment {id} not found"),
        )
    }

    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Authorization { .. } => "authorization",
            Self::Persistence(_) => "persistence",
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. }
            | Self::NotFound { code, .. }
            | Self::Conflict { code, .. }
            | Self::Authorization { code, .. } => *code,
            Self::Persistence(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<RepoError> for SchedulingError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => Self::not_found(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => Self::conflict(ErrorCode::AlreadyExists, msg),
            RepoError::Validation(msg) => Self::validation(ErrorCode::ValidationFailed, msg),
            RepoError::Database(msg) => Self::Persistence(msg),
        }
    }
}

impl From<sqlx::Error> for SchedulingError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::from(err).into()
    }
}

impl From<AppError> for SchedulingError {
    fn from(err: AppError) -> Self {
        Self::validation(err.code, err.message)
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        let kind = err.kind();
        match err {
            SchedulingError::Persistence(msg) => {
                tracing::error!(error = %msg, "Scheduling persistence failure");
                AppError::database(msg).with_detail("kind", kind)
            }
            other => {
                AppError::with_message(other.code(), other.to_string()).with_detail("kind", kind)
            }
        }
    }
}
