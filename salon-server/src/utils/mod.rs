//! Utility module - shared helpers
//!
//! - [`AppError`] / [`ErrorResponse`] re-exported from `shared::error`
//! - logging setup, input validation, time conversion

pub mod logger;
pub mod time;
pub mod validation;

pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode, ErrorResponse};
