//! Payment Repository
//!
//! Payment records written by settlement and by the card-payment flow.
//! `payment_intent_id` is UNIQUE: one intent settles one appointment.

use super::{RepoError, RepoResult, parse_decimal};
use rust_decimal::Decimal;
use shared::models::{Payment, PaymentMethod, PaymentRecordStatus};
use sqlx::SqliteConnection;

const PAYMENT_SELECT: &str = "SELECT id, tenant_id, appointment_id, amount, method, status, payment_intent_id, paid_at, created_at FROM payments";

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    tenant_id: i64,
    appointment_id: i64,
    amount: String,
    method: String,
    status: String,
    payment_intent_id: Option<String>,
    paid_at: Option<i64>,
    created_at: i64,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepoError;

    fn try_from(row: PaymentRow) -> RepoResult<Self> {
        Ok(Self {
            id: row.id,
            tenant_id: row.tenant_id,
            appointment_id: row.appointment_id,
            amount: parse_decimal(&row.amount, "payments.amount")?,
            method: row.method.parse::<PaymentMethod>()?,
            status: row.status.parse::<PaymentRecordStatus>()?,
            payment_intent_id: row.payment_intent_id,
            paid_at: row.paid_at,
            created_at: row.created_at,
        })
    }
}

/// Record a settled payment (`succeeded`, `paid_at` set)
pub async fn insert_succeeded(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    appointment_id: i64,
    amount: Decimal,
    method: PaymentMethod,
    paid_at: i64,
) -> RepoResult<Payment> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO payments (id, tenant_id, appointment_id, amount, method, status, paid_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5, 'succeeded', ?6, ?6)",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(appointment_id)
    .bind(amount.to_string())
    .bind(method.as_str())
    .bind(paid_at)
    .execute(&mut *conn)
    .await?;
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record payment".into()))
}

/// Create or refresh the pending card payment of an appointment
///
/// An appointment has at most one pending card payment; registering a new
/// intent re-points it. An intent already used elsewhere is a `Duplicate`.
pub async fn upsert_pending(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    appointment_id: i64,
    amount: Decimal,
    payment_intent_id: &str,
) -> RepoResult<Payment> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM payments WHERE tenant_id = ? AND appointment_id = ? AND method = 'stripe' AND status = 'pending' ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(tenant_id)
    .bind(appointment_id)
    .fetch_optional(&mut *conn)
    .await?;

    let id = match existing {
        Some(id) => {
            sqlx::query(
                "UPDATE payments SET amount = ?1, payment_intent_id = ?2, paid_at = NULL WHERE id = ?3",
            )
            .bind(amount.to_string())
            .bind(payment_intent_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;
            id
        }
        None => {
            let id = shared::util::snowflake_id();
            let now = shared::util::now_millis();
            sqlx::query(
                "INSERT INTO payments (id, tenant_id, appointment_id, amount, method, status, payment_intent_id, created_at) VALUES (?1, ?2, ?3, ?4, 'stripe', 'pending', ?5, ?6)",
            )
            .bind(id)
            .bind(tenant_id)
            .bind(appointment_id)
            .bind(amount.to_string())
            .bind(payment_intent_id)
            .bind(now)
            .execute(&mut *conn)
            .await?;
            id
        }
    };

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record pending payment".into()))
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.map(Payment::try_from).transpose()
}

/// Lookup by processor intent id (webhooks carry no tenant)
pub async fn find_by_intent(
    conn: &mut SqliteConnection,
    payment_intent_id: &str,
) -> RepoResult<Option<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE payment_intent_id = ?");
    let row = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(payment_intent_id)
        .fetch_optional(conn)
        .await?;
    row.map(Payment::try_from).transpose()
}

pub async fn list_by_appointment(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    appointment_id: i64,
) -> RepoResult<Vec<Payment>> {
    let sql = format!(
        "{PAYMENT_SELECT} WHERE tenant_id = ? AND appointment_id = ? ORDER BY created_at, id"
    );
    let rows = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(tenant_id)
        .bind(appointment_id)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(Payment::try_from).collect()
}

pub async fn mark_succeeded(conn: &mut SqliteConnection, id: i64, paid_at: i64) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE payments SET status = 'succeeded', paid_at = ? WHERE id = ?")
        .bind(paid_at)
        .bind(id)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Payment {id} not found")));
    }
    Ok(())
}
