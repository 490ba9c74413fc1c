//! Processor webhook events
//!
//! Only `payment_intent.succeeded` changes state. Every other verified
//! event is acknowledged untouched, and so is an intent no payment
//! record knows about.

use serde::Deserialize;

use crate::scheduling::{CardPaymentOutcome, SchedulingResult, SchedulingService};

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Option<EventData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventObject {
    #[serde(default)]
    pub id: Option<String>,
}

impl WebhookEvent {
    fn object_id(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.object.id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Settled { payment_id: i64, appointment_id: i64 },
    AlreadySettled { payment_id: i64 },
    Unmatched { payment_intent_id: String },
    Ignored { event_type: String },
}

/// Apply one verified event
pub async fn handle_event(
    scheduling: &SchedulingService,
    event: &WebhookEvent,
    now_ms: i64,
) -> SchedulingResult<WebhookOutcome> {
    if event.event_type != PAYMENT_INTENT_SUCCEEDED {
        tracing::debug!(event_type = %event.event_type, "Ignoring webhook event");
        return Ok(WebhookOutcome::Ignored {
            event_type: event.event_type.clone(),
        });
    }

    let Some(intent_id) = event.object_id() else {
        tracing::warn!(event_id = ?event.id, "payment_intent.succeeded without an intent id");
        return Ok(WebhookOutcome::Unmatched {
            payment_intent_id: String::new(),
        });
    };

    match scheduling.settle_card_payment(intent_id, now_ms).await? {
        CardPaymentOutcome::Settled {
            payment_id,
            appointment_id,
        } => Ok(WebhookOutcome::Settled {
            payment_id,
            appointment_id,
        }),
        CardPaymentOutcome::AlreadySettled { payment_id, .. } => {
            tracing::info!(payment_id, "Duplicate payment confirmation, skipping");
            Ok(WebhookOutcome::AlreadySettled { payment_id })
        }
        CardPaymentOutcome::Unmatched => {
            tracing::warn!(
                payment_intent_id = intent_id,
                event_id = ?event.id,
                "No payment matches the succeeded intent"
            );
            Ok(WebhookOutcome::Unmatched {
                payment_intent_id: intent_id.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::{appointment, payment, service, shop, staff};
    use crate::scheduling::Caller;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use shared::models::{
        AppointmentCreate, PaymentRecordStatus, PaymentStatus, PendingPaymentCreate, Role,
    };

    fn succeeded(intent: &str) -> WebhookEvent {
        serde_json::from_value(serde_json::json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": { "object": { "id": intent, "object": "payment_intent" } }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn succeeded_intent_marks_payment_and_appointment() {
        let db = DbService::in_memory().await.unwrap();
        let (tenant_id, staff_id, service_id) = {
            let mut conn = db.pool.acquire().await.unwrap();
            let shop = shop::create(&mut conn, "Sharp").await.unwrap();
            let barber = staff::create(
                &mut conn,
                shop.id,
                staff::StaffCreate {
                    name: "Ana".into(),
                    role: Role::Barber,
                    commission_type: None,
                    commission_value: Decimal::ZERO,
                },
            )
            .await
            .unwrap();
            let svc = service::create(&mut conn, shop.id, "Cut", Decimal::from(800), 30)
                .await
                .unwrap();
            (shop.id, barber.id, svc.id)
        };

        let scheduling = SchedulingService::new(db.pool.clone());
        let owner = Caller::new(1, tenant_id, Role::Owner);
        let appt = scheduling
            .book_appointment(
                &owner,
                AppointmentCreate {
                    staff_id,
                    customer_id: None,
                    new_customer: None,
                    service_ids: vec![service_id],
                    start_at: Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(),
                    duration_minutes: None,
                    total_price: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        let pending = scheduling
            .register_pending_payment(
                &owner,
                appt.id,
                PendingPaymentCreate {
                    payment_intent_id: "pi_123".into(),
                },
            )
            .await
            .unwrap();

        let outcome = handle_event(&scheduling, &succeeded("pi_123"), 1_704_900_000_000)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Settled {
                payment_id: pending.id,
                appointment_id: appt.id
            }
        );

        let mut conn = db.pool.acquire().await.unwrap();
        let paid = payment::find_by_id(&mut conn, pending.id).await.unwrap().unwrap();
        assert_eq!(paid.status, PaymentRecordStatus::Succeeded);
        assert_eq!(paid.paid_at, Some(1_704_900_000_000));
        let after = appointment::find_by_id(&mut conn, tenant_id, appt.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.payment_status, PaymentStatus::Paid);
        drop(conn);

        let again = handle_event(&scheduling, &succeeded("pi_123"), 1_704_900_100_000)
            .await
            .unwrap();
        assert_eq!(
            again,
            WebhookOutcome::AlreadySettled {
                payment_id: pending.id
            }
        );
    }

    #[tokio::test]
    async fn unknown_intent_and_other_events_are_acknowledged() {
        let db = DbService::in_memory().await.unwrap();
        let scheduling = SchedulingService::new(db.pool.clone());

        let outcome = handle_event(&scheduling, &succeeded("pi_missing"), 0).await.unwrap();
        assert!(matches!(outcome, WebhookOutcome::Unmatched { .. }));

        let other: WebhookEvent = serde_json::from_value(serde_json::json!({
            "id": "evt_2",
            "type": "charge.refunded",
            "data": { "object": { "id": "ch_1" } }
        }))
        .unwrap();
        let outcome = handle_event(&scheduling, &other, 0).await.unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Ignored {
                event_type: "charge.refunded".into()
            }
        );
    }
}
