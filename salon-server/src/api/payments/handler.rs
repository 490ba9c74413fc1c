//! Payment webhook handler

use axum::{Json, body::Bytes, extract::State};
use http::HeaderMap;
use serde_json::{Value, json};

use crate::core::ServerState;
use crate::payments::{WebhookOutcome, handle_event, stripe, webhook::WebhookEvent};
use crate::utils::{AppError, AppResult, ErrorCode};

/// POST /api/payments/webhook
pub async fn webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let Some(sig_header) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing Stripe-Signature header");
        return Err(AppError::new(ErrorCode::WebhookSignatureInvalid));
    };

    if let Err(e) =
        stripe::verify_webhook_signature(&body, sig_header, state.stripe_webhook_secret())
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return Err(AppError::with_message(ErrorCode::WebhookSignatureInvalid, e));
    }

    let event: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(%e, "Failed to parse webhook JSON");
        AppError::invalid_request(format!("Malformed webhook payload: {e}"))
    })?;
    tracing::info!(
        event_type = %event.event_type,
        event_id = ?event.id,
        "Received payment webhook"
    );

    let outcome = handle_event(&state.scheduling, &event, shared::util::now_millis()).await?;
    let status = match outcome {
        WebhookOutcome::Settled { .. } => "settled",
        WebhookOutcome::AlreadySettled { .. } => "duplicate",
        WebhookOutcome::Unmatched { .. } => "unmatched",
        WebhookOutcome::Ignored { .. } => "ignored",
    };
    Ok(Json(json!({ "received": true, "status": status })))
}
