//! Double-booking detection
//!
//! Intervals are half-open: an appointment ending at 10:30 does not
//! collide with one starting at 10:30. Cancelled appointments never block.

use super::error::{SchedulingError, SchedulingResult};
use crate::db::repository::appointment;
use crate::utils::time::to_millis;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

/// Whether the staff member already has a non-cancelled appointment
/// overlapping `[start, end)`, ignoring `exclude_id`
pub async fn has_conflict(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    staff_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<i64>,
) -> SchedulingResult<bool> {
    Ok(appointment::has_overlap(
        conn,
        tenant_id,
        staff_id,
        to_millis(start),
        to_millis(end),
        exclude_id,
    )
    .await?)
}

/// `has_conflict` as a precondition
pub async fn ensure_slot_free(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    staff_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<i64>,
) -> SchedulingResult<()> {
    if has_conflict(conn, tenant_id, staff_id, start, end, exclude_id).await? {
        tracing::debug!(tenant_id, staff_id, %start, %end, "Slot already taken");
        return Err(SchedulingError::slot_taken());
    }
    Ok(())
}
