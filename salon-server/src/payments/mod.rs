//! Card payment relay
//!
//! - [`stripe`] - webhook signature verification
//! - [`webhook`] - event dispatch into the scheduling facade

pub mod stripe;
pub mod webhook;

pub use webhook::{WebhookOutcome, handle_event};
