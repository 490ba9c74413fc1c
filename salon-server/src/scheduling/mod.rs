//! Appointment scheduling
//!
//! - [`ledger`]: appointment mutations on a transaction connection
//! - [`conflict`]: per-staff double-booking detection
//! - [`commission`]: settlement on completion
//! - [`access`]: caller identity and authorization
//! - [`lock`]: per-staff write serialization
//! - [`facade`]: [`SchedulingService`], the API handlers' entry point

pub mod access;
pub mod commission;
pub mod conflict;
pub mod error;
pub mod facade;
pub mod ledger;
pub mod lock;

pub use access::Caller;
pub use commission::{Settlement, compute_commission};
pub use error::{SchedulingError, SchedulingResult};
pub use facade::{CardPaymentOutcome, SchedulingService};
