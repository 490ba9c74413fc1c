//! Commission settlement
//!
//! Runs once, on the transition of an appointment into `completed`, inside
//! the transaction that writes the status change.

use super::error::SchedulingResult;
use crate::db::repository::{customer, payment, staff};
use rust_decimal::{Decimal, RoundingStrategy};
use shared::models::{
    Appointment, CommissionTerms, CommissionType, Payment, PaymentMethod, PaymentStatus,
};
use sqlx::SqliteConnection;

/// Commission owed for `total` under `terms`: clamped to `[0, total]`,
/// rounded to cents (midpoint away from zero)
pub fn compute_commission(total: Decimal, terms: &CommissionTerms) -> Decimal {
    let raw = match terms.commission_type {
        Some(CommissionType::Percentage) => total * terms.value / Decimal::ONE_HUNDRED,
        Some(CommissionType::Fixed) => terms.value,
        None => Decimal::ZERO,
    };
    let mut commission = raw
        .min(total)
        .max(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    commission.rescale(2);
    commission
}

/// Result of settling one appointment
#[derive(Debug, Clone)]
pub struct Settlement {
    pub commission: Decimal,
    pub payment: Option<Payment>,
    pub customer_stamped: bool,
}

/// Re-derive the commission of `appt` from its current total and staff terms
pub async fn recompute(
    conn: &mut SqliteConnection,
    appt: &mut Appointment,
) -> SchedulingResult<Decimal> {
    let terms = staff::commission_terms(conn, appt.tenant_id, appt.staff_id)
        .await?
        .unwrap_or_else(CommissionTerms::none);
    appt.commission_amount = compute_commission(appt.total_price, &terms);
    Ok(appt.commission_amount)
}

/// Settle `appt` (already carrying its final total) at `now_ms`.
///
/// Writes the customer's last visit and, for `paid` / `semi-paid`, a
/// succeeded payment record. The appointment row itself is persisted by
/// the caller.
pub async fn settle(
    conn: &mut SqliteConnection,
    appt: &mut Appointment,
    payment_status: Option<PaymentStatus>,
    method: Option<PaymentMethod>,
    now_ms: i64,
) -> SchedulingResult<Settlement> {
    let commission = recompute(conn, appt).await?;

    let customer_stamped = match appt.customer_id {
        Some(customer_id) => {
            customer::touch_last_visit(conn, appt.tenant_id, customer_id, now_ms).await?
        }
        None => false,
    };

    let mut recorded = None;
    if let Some(status) = payment_status {
        if status.records_payment() {
            recorded = Some(
                payment::insert_succeeded(
                    conn,
                    appt.tenant_id,
                    appt.id,
                    appt.total_price,
                    method.unwrap_or_default(),
                    now_ms,
                )
                .await?,
            );
        }
        appt.payment_status = status;
    }

    tracing::info!(
        tenant_id = appt.tenant_id,
        appointment_id = appt.id,
        staff_id = appt.staff_id,
        total = %appt.total_price,
        commission = %commission,
        payment_recorded = recorded.is_some(),
        "Appointment settled"
    );

    Ok(Settlement {
        commission,
        payment: recorded,
        customer_stamped,
    })
}
