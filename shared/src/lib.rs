//! Shared types for the salon platform
//!
//! Common types used by salon-server and its API clients: the unified
//! error system, domain models, and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
