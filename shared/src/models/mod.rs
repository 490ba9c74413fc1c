//! Data models
//!
//! Shared between salon-server and booking clients (via API).
//! All IDs are `i64` snowflakes, money is `rust_decimal::Decimal`
//! (serialized as a string), bookkeeping timestamps are UTC millis.

pub mod appointment;
pub mod customer;
pub mod payment;
pub mod service;
pub mod shop;
pub mod staff;

// Re-exports
pub use appointment::*;
pub use customer::*;
pub use payment::*;
pub use service::*;
pub use shop::*;
pub use staff::*;

use thiserror::Error;

/// A stored enum column held a value this build does not know
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
