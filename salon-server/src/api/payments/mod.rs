//! Payment webhook API
//!
//! `POST /api/payments/webhook` is public; authenticity comes from the
//! `Stripe-Signature` header.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/payments/webhook", post(handler::webhook))
}
