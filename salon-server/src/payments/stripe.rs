//! Stripe webhook signatures
//!
//! `Stripe-Signature: t=<unix seconds>,v1=<hex hmac>[,v1=...]` where the MAC is
//! HMAC-SHA256 over `"{t}.{raw body}"` keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Maximum accepted age of a signed event (seconds)
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Verify against the current time
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    verify_webhook_signature_at(payload, sig_header, secret, chrono::Utc::now().timestamp())
}

/// Verify as of `now` (unix seconds). Any matching `v1` entry is accepted.
pub fn verify_webhook_signature_at(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err("Webhook timestamp outside tolerance");
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err("Webhook signature mismatch");
    }
    Ok(())
}

/// Build a `Stripe-Signature` header value (used by tests and local tooling)
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, &'static str> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let sig = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={timestamp},v1={sig}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

    #[test]
    fn valid_signature_within_tolerance() {
        let header = sign_payload(BODY, SECRET, 1_700_000_000).unwrap();
        assert!(verify_webhook_signature_at(BODY, &header, SECRET, 1_700_000_120).is_ok());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let header = sign_payload(BODY, SECRET, 1_700_000_000).unwrap();
        let tampered = br#"{"id":"evt_1","type":"payment_intent.canceled"}"#;
        assert_eq!(
            verify_webhook_signature_at(tampered, &header, SECRET, 1_700_000_000),
            Err("Webhook signature mismatch")
        );
    }

    #[test]
    fn stale_event_is_rejected() {
        let header = sign_payload(BODY, SECRET, 1_700_000_000).unwrap();
        assert!(verify_webhook_signature_at(BODY, &header, SECRET, 1_700_000_301).is_err());
    }

    #[test]
    fn wrong_secret_and_garbage_headers() {
        let header = sign_payload(BODY, "whsec_other", 1_700_000_000).unwrap();
        assert!(verify_webhook_signature_at(BODY, &header, SECRET, 1_700_000_000).is_err());
        assert!(verify_webhook_signature_at(BODY, "v1=abcd", SECRET, 1_700_000_000).is_err());
        let forged = "t=1700000000,v1=zz";
        assert!(verify_webhook_signature_at(BODY, forged, SECRET, 1_700_000_000).is_err());
    }

    #[test]
    fn any_v1_entry_may_match() {
        let good = sign_payload(BODY, SECRET, 1_700_000_000).unwrap();
        let sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t=1700000000,v1={},v1={sig}", "00".repeat(32));
        assert!(verify_webhook_signature_at(BODY, &header, SECRET, 1_700_000_000).is_ok());
    }
}
