//! Appointment Repository
//!
//! Appointments and their line items (`appointment_services`). Line items
//! carry the service price at booking time and are never re-priced.

use super::{RepoError, RepoResult, parse_decimal, parse_instant};
use crate::utils::time::to_millis;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{
    Appointment, AppointmentFilter, AppointmentService, AppointmentStatus, PaymentStatus,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::collections::HashMap;

const APPOINTMENT_SELECT: &str = "SELECT id, tenant_id, staff_id, customer_id, start_at, end_at, status, payment_status, total_price, commission_amount, notes, created_at, updated_at FROM appointments";

/// Upper bound for a single calendar page
pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: i64,
    tenant_id: i64,
    staff_id: i64,
    customer_id: Option<i64>,
    start_at: i64,
    end_at: i64,
    status: String,
    payment_status: String,
    total_price: String,
    commission_amount: String,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = RepoError;

    fn try_from(row: AppointmentRow) -> RepoResult<Self> {
        Ok(Self {
            id: row.id,
            tenant_id: row.tenant_id,
            staff_id: row.staff_id,
            customer_id: row.customer_id,
            start_at: parse_instant(row.start_at, "appointments.start_at")?,
            end_at: parse_instant(row.end_at, "appointments.end_at")?,
            status: row.status.parse::<AppointmentStatus>()?,
            payment_status: row.payment_status.parse::<PaymentStatus>()?,
            total_price: parse_decimal(&row.total_price, "appointments.total_price")?,
            commission_amount: parse_decimal(
                &row.commission_amount,
                "appointments.commission_amount",
            )?,
            notes: row.notes,
            services: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineItemRow {
    appointment_id: i64,
    service_id: i64,
    name: String,
    price_at_time: String,
}

impl TryFrom<LineItemRow> for AppointmentService {
    type Error = RepoError;

    fn try_from(row: LineItemRow) -> RepoResult<Self> {
        Ok(Self {
            service_id: row.service_id,
            name: row.name,
            price_at_time: parse_decimal(&row.price_at_time, "appointment_services.price_at_time")?,
        })
    }
}

/// Insert payload for a new appointment row
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub id: i64,
    pub tenant_id: i64,
    pub staff_id: i64,
    pub customer_id: Option<i64>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub total_price: Decimal,
    pub notes: Option<String>,
}

/// Snapshot of a booked service
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineItemSnapshot {
    pub service_id: i64,
    pub price_at_time: Decimal,
}

// ── Reads ───────────────────────────────────────────────────────────

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
) -> RepoResult<Option<Appointment>> {
    let sql = format!("{APPOINTMENT_SELECT} WHERE tenant_id = ? AND id = ?");
    let row = sqlx::query_as::<_, AppointmentRow>(&sql)
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut appointment = Appointment::try_from(row)?;
    appointment.services = find_line_items(conn, appointment.id).await?;
    Ok(Some(appointment))
}

pub async fn find_line_items(
    conn: &mut SqliteConnection,
    appointment_id: i64,
) -> RepoResult<Vec<AppointmentService>> {
    let rows = sqlx::query_as::<_, LineItemRow>(
        "SELECT aps.appointment_id, aps.service_id, s.name, aps.price_at_time FROM appointment_services aps JOIN services s ON s.id = aps.service_id WHERE aps.appointment_id = ? ORDER BY aps.service_id",
    )
    .bind(appointment_id)
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(AppointmentService::try_from).collect()
}

/// Calendar feed, ordered by start time
pub async fn list(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    filter: &AppointmentFilter,
) -> RepoResult<Vec<Appointment>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(APPOINTMENT_SELECT);
    qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
    if let Some(from) = filter.from {
        qb.push(" AND start_at >= ").push_bind(to_millis(from));
    }
    if let Some(to) = filter.to {
        qb.push(" AND start_at < ").push_bind(to_millis(to));
    }
    if let Some(staff_id) = filter.staff_id {
        qb.push(" AND staff_id = ").push_bind(staff_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(payment_status) = filter.payment_status {
        qb.push(" AND payment_status = ").push_bind(payment_status.as_str());
    }
    let limit = filter.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = filter.offset.unwrap_or(0).max(0);
    qb.push(" ORDER BY start_at, id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = qb
        .build_query_as::<AppointmentRow>()
        .fetch_all(&mut *conn)
        .await?;
    let mut appointments = rows
        .into_iter()
        .map(Appointment::try_from)
        .collect::<RepoResult<Vec<_>>>()?;

    if appointments.is_empty() {
        return Ok(appointments);
    }

    let mut items = QueryBuilder::<Sqlite>::new(
        "SELECT aps.appointment_id, aps.service_id, s.name, aps.price_at_time FROM appointment_services aps JOIN services s ON s.id = aps.service_id WHERE aps.appointment_id IN (",
    );
    let mut separated = items.separated(", ");
    for a in &appointments {
        separated.push_bind(a.id);
    }
    separated.push_unseparated(") ORDER BY aps.appointment_id, aps.service_id");
    let item_rows = items.build_query_as::<LineItemRow>().fetch_all(conn).await?;

    let mut grouped: HashMap<i64, Vec<AppointmentService>> = HashMap::new();
    for row in item_rows {
        let appointment_id = row.appointment_id;
        grouped
            .entry(appointment_id)
            .or_default()
            .push(AppointmentService::try_from(row)?);
    }
    for a in &mut appointments {
        a.services = grouped.remove(&a.id).unwrap_or_default();
    }
    Ok(appointments)
}

/// True iff a non-cancelled appointment of the staff member overlaps
/// the half-open interval `[start_ms, end_ms)`.
pub async fn has_overlap(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    staff_id: i64,
    start_ms: i64,
    end_ms: i64,
    exclude_id: Option<i64>,
) -> RepoResult<bool> {
    let hit: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM appointments WHERE tenant_id = ?1 AND staff_id = ?2 AND status != 'cancelled' AND start_at < ?4 AND end_at > ?3 AND (?5 IS NULL OR id != ?5) LIMIT 1",
    )
    .bind(tenant_id)
    .bind(staff_id)
    .bind(start_ms)
    .bind(end_ms)
    .bind(exclude_id)
    .fetch_optional(conn)
    .await?;
    Ok(hit.is_some())
}

// ── Writes ──────────────────────────────────────────────────────────

/// Insert a `scheduled` / `unpaid` appointment
pub async fn insert(conn: &mut SqliteConnection, data: &NewAppointment) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO appointments (id, tenant_id, staff_id, customer_id, start_at, end_at, status, payment_status, total_price, commission_amount, notes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'scheduled', 'unpaid', ?7, '0', ?8, ?9, ?9)",
    )
    .bind(data.id)
    .bind(data.tenant_id)
    .bind(data.staff_id)
    .bind(data.customer_id)
    .bind(to_millis(data.start_at))
    .bind(to_millis(data.end_at))
    .bind(data.total_price.to_string())
    .bind(&data.notes)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Persist every mutable column of `appointment`
pub async fn save(conn: &mut SqliteConnection, appointment: &Appointment) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE appointments SET staff_id = ?1, customer_id = ?2, start_at = ?3, end_at = ?4, status = ?5, payment_status = ?6, total_price = ?7, commission_amount = ?8, notes = ?9, updated_at = ?10 WHERE tenant_id = ?11 AND id = ?12",
    )
    .bind(appointment.staff_id)
    .bind(appointment.customer_id)
    .bind(to_millis(appointment.start_at))
    .bind(to_millis(appointment.end_at))
    .bind(appointment.status.as_str())
    .bind(appointment.payment_status.as_str())
    .bind(appointment.total_price.to_string())
    .bind(appointment.commission_amount.to_string())
    .bind(&appointment.notes)
    .bind(now)
    .bind(appointment.tenant_id)
    .bind(appointment.id)
    .execute(conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Appointment {} not found",
            appointment.id
        )));
    }
    Ok(())
}

pub async fn set_payment_status(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
    status: PaymentStatus,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE appointments SET payment_status = ?1, updated_at = ?2 WHERE tenant_id = ?3 AND id = ?4",
    )
    .bind(status.as_str())
    .bind(now)
    .bind(tenant_id)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Replace all line items of an appointment
pub async fn replace_line_items(
    conn: &mut SqliteConnection,
    appointment_id: i64,
    items: &[LineItemSnapshot],
) -> RepoResult<()> {
    sqlx::query("DELETE FROM appointment_services WHERE appointment_id = ?")
        .bind(appointment_id)
        .execute(&mut *conn)
        .await?;
    for item in items {
        sqlx::query(
            "INSERT INTO appointment_services (appointment_id, service_id, price_at_time) VALUES (?1, ?2, ?3)",
        )
        .bind(appointment_id)
        .bind(item.service_id)
        .bind(item.price_at_time.to_string())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Delete an appointment; line items and payments cascade
pub async fn delete(conn: &mut SqliteConnection, tenant_id: i64, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM appointments WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}
