//! Appointment ledger
//!
//! All appointment mutations. Every function runs on the caller's
//! transaction connection and either fully applies or returns an error
//! before the caller commits. Start / end / staff changes all go through
//! [`move_appointment`], the single conflict-checked time mutation.

use super::commission::{self, Settlement};
use super::conflict;
use super::error::{SchedulingError, SchedulingResult};
use crate::db::repository::appointment::{
    self as appointment_repo, LineItemSnapshot, NewAppointment,
};
use crate::db::repository::{customer, service, staff};
use crate::utils::time::add_minutes;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{
    Appointment, AppointmentCreate, AppointmentStatus, AppointmentUpdate, CustomerRef, Service,
};
use sqlx::SqliteConnection;

/// Outcome of an update, with the settlement when one happened
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub appointment: Appointment,
    pub settlement: Option<Settlement>,
}

// ── Validation helpers ──────────────────────────────────────────────

fn validate_duration(minutes: Option<i64>) -> SchedulingResult<()> {
    match minutes {
        Some(m) if m <= 0 => Err(SchedulingError::validation(
            ErrorCode::InvalidDuration,
            format!("Duration must be positive, got {m} minutes"),
        )),
        _ => Ok(()),
    }
}

fn validate_explicit_price(price: Option<Decimal>) -> SchedulingResult<()> {
    match price {
        Some(p) if p <= Decimal::ZERO => Err(SchedulingError::validation(
            ErrorCode::InvalidAmount,
            format!("Total price must be positive, got {p}"),
        )),
        _ => Ok(()),
    }
}

fn end_after(start: DateTime<Utc>, minutes: i64) -> SchedulingResult<DateTime<Utc>> {
    add_minutes(start, minutes).ok_or_else(|| {
        SchedulingError::validation(ErrorCode::InvalidTimeRange, "Appointment end is out of range")
    })
}

/// Empty notes clear the field
fn normalize_notes(notes: Option<&String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

fn sum_durations(services: &[Service]) -> i64 {
    services.iter().map(|s| s.duration_minutes).sum()
}

fn sum_prices(services: &[Service]) -> Decimal {
    services.iter().map(|s| s.price).sum()
}

fn snapshots(services: &[Service]) -> Vec<LineItemSnapshot> {
    services
        .iter()
        .map(|s| LineItemSnapshot {
            service_id: s.id,
            price_at_time: s.price,
        })
        .collect()
}

// ── Catalog reads ───────────────────────────────────────────────────

/// Resolve bookable services, keeping request order and dropping duplicates.
///
/// Empty set, unknown ids and inactive services are validation failures.
pub async fn resolve_services(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    ids: &[i64],
) -> SchedulingResult<Vec<Service>> {
    let mut unique: Vec<i64> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    if unique.is_empty() {
        return Err(SchedulingError::validation(
            ErrorCode::EmptyServiceSet,
            ErrorCode::EmptyServiceSet.message(),
        ));
    }

    let found = service::find_many(conn, tenant_id, &unique).await?;
    let mut resolved = Vec::with_capacity(unique.len());
    for id in unique {
        let Some(svc) = found.iter().find(|s| s.id == id) else {
            return Err(SchedulingError::validation(
                ErrorCode::ServiceNotFound,
                format!("Service {id} not found"),
            ));
        };
        if !svc.is_active {
            return Err(SchedulingError::validation(
                ErrorCode::ServiceInactive,
                format!("Service '{}' is not active", svc.name),
            ));
        }
        resolved.push(svc.clone());
    }
    Ok(resolved)
}

/// The staff member must belong to the shop and be active
async fn ensure_bookable_staff(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    staff_id: i64,
) -> SchedulingResult<()> {
    match staff::find_by_id(conn, tenant_id, staff_id).await? {
        Some(member) if member.is_active => Ok(()),
        Some(member) => Err(SchedulingError::validation(
            ErrorCode::StaffInactive,
            format!("Staff member '{}' is not active", member.name),
        )),
        None => Err(SchedulingError::not_found(
            ErrorCode::StaffNotFound,
            format!("Staff member {staff_id} not found"),
        )),
    }
}

async fn load(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
) -> SchedulingResult<Appointment> {
    appointment_repo::find_by_id(conn, tenant_id, id)
        .await?
        .ok_or_else(|| SchedulingError::appointment_not_found(id))
}

/// Minutes covered by the services currently on the appointment, looked up
/// in the catalog. `None` when there are none or one has left the catalog.
async fn attached_service_minutes(
    conn: &mut SqliteConnection,
    appt: &Appointment,
) -> SchedulingResult<Option<i64>> {
    if appt.services.is_empty() {
        return Ok(None);
    }
    let ids: Vec<i64> = appt.services.iter().map(|s| s.service_id).collect();
    let found = service::find_many(conn, appt.tenant_id, &ids).await?;
    if found.len() != ids.len() {
        return Ok(None);
    }
    Ok(Some(sum_durations(&found)))
}

// ── Operations ──────────────────────────────────────────────────────

/// Book a new appointment (`scheduled`, `unpaid`)
pub async fn create(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    cmd: &AppointmentCreate,
) -> SchedulingResult<Appointment> {
    validate_duration(cmd.duration_minutes)?;
    validate_explicit_price(cmd.total_price)?;
    validate_optional_text(&cmd.notes, "notes", MAX_NOTE_LEN)?;

    let customer_ref = cmd.customer_ref();
    if let CustomerRef::New(new) = &customer_ref {
        if new.name.trim().is_empty() {
            return Err(SchedulingError::validation(
                ErrorCode::CustomerNameRequired,
                ErrorCode::CustomerNameRequired.message(),
            ));
        }
        validate_required_text(&new.name, "customer name", MAX_NAME_LEN)?;
        validate_optional_text(&new.phone, "customer phone", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&new.notes, "customer notes", MAX_NOTE_LEN)?;
    }

    ensure_bookable_staff(conn, tenant_id, cmd.staff_id).await?;
    let services = resolve_services(conn, tenant_id, &cmd.service_ids).await?;

    let minutes = cmd.duration_minutes.unwrap_or_else(|| sum_durations(&services));
    validate_duration(Some(minutes))?;
    let start = cmd.start_at;
    let end = end_after(start, minutes)?;
    let total = cmd.total_price.unwrap_or_else(|| sum_prices(&services));

    if let CustomerRef::Existing(customer_id) = customer_ref
        && customer::find_by_id(conn, tenant_id, customer_id).await?.is_none()
    {
        return Err(SchedulingError::not_found(
            ErrorCode::CustomerNotFound,
            format!("Customer {customer_id} not found"),
        ));
    }

    conflict::ensure_slot_free(conn, tenant_id, cmd.staff_id, start, end, None).await?;

    let customer_id = match &customer_ref {
        CustomerRef::None => None,
        CustomerRef::Existing(id) => Some(*id),
        CustomerRef::New(new) => Some(customer::create(conn, tenant_id, new).await?.id),
    };

    let id = shared::util::snowflake_id();
    appointment_repo::insert(
        conn,
        &NewAppointment {
            id,
            tenant_id,
            staff_id: cmd.staff_id,
            customer_id,
            start_at: start,
            end_at: end,
            total_price: total,
            notes: normalize_notes(cmd.notes.as_ref()),
        },
    )
    .await?;
    appointment_repo::replace_line_items(conn, id, &snapshots(&services)).await?;

    load(conn, tenant_id, id).await
}

/// The shared time/staff mutation: conflict-checks the target slot
/// (unless the appointment will not occupy it) and applies it in memory.
pub async fn move_appointment(
    conn: &mut SqliteConnection,
    appt: &mut Appointment,
    staff_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    occupies_slot: bool,
) -> SchedulingResult<()> {
    if end <= start {
        return Err(SchedulingError::validation(
            ErrorCode::InvalidTimeRange,
            ErrorCode::InvalidTimeRange.message(),
        ));
    }
    if occupies_slot {
        conflict::ensure_slot_free(conn, appt.tenant_id, staff_id, start, end, Some(appt.id))
            .await?;
    }
    appt.staff_id = staff_id;
    appt.start_at = start;
    appt.end_at = end;
    Ok(())
}

/// Move an appointment to `[start, end)`
pub async fn reschedule(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> SchedulingResult<Appointment> {
    if end <= start {
        return Err(SchedulingError::validation(
            ErrorCode::InvalidTimeRange,
            ErrorCode::InvalidTimeRange.message(),
        ));
    }
    let mut appt = load(conn, tenant_id, id).await?;
    let staff_id = appt.staff_id;
    let occupies = appt.status.occupies_slot();
    move_appointment(conn, &mut appt, staff_id, start, end, occupies).await?;
    appointment_repo::save(conn, &appt).await?;
    load(conn, tenant_id, id).await
}

/// Apply a partial update. Precedence:
/// 1. new start ⇒ end = start + (explicit duration | new services | attached services | current);
/// 2. duration only ⇒ end = current start + duration;
/// 3. new services replace line items and the total (unless a price is given);
/// 4. explicit total price last; then the status transition and settlement.
pub async fn update(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
    changes: &AppointmentUpdate,
    now_ms: i64,
) -> SchedulingResult<UpdateOutcome> {
    validate_duration(changes.duration_minutes)?;
    validate_explicit_price(changes.total_price)?;
    validate_optional_text(&changes.notes, "notes", MAX_NOTE_LEN)?;

    let mut appt = load(conn, tenant_id, id).await?;
    let original_total = appt.total_price;
    let current_status = appt.status;
    let target_status = changes.status.unwrap_or(current_status);
    if !current_status.can_transition_to(target_status) {
        return Err(SchedulingError::validation(
            ErrorCode::InvalidStatusTransition,
            format!(
                "Cannot change status from {} to {}",
                current_status.as_str(),
                target_status.as_str()
            ),
        ));
    }

    let target_staff = changes.staff_id.unwrap_or(appt.staff_id);
    if target_staff != appt.staff_id {
        ensure_bookable_staff(conn, tenant_id, target_staff).await?;
    }

    let new_services = match &changes.service_ids {
        Some(ids) => Some(resolve_services(conn, tenant_id, ids).await?),
        None => None,
    };

    // 1 + 2: interval
    let (start, end) = if let Some(start) = changes.start_at {
        let minutes = match (changes.duration_minutes, &new_services) {
            (Some(m), _) => m,
            (None, Some(services)) => sum_durations(services),
            (None, None) => attached_service_minutes(conn, &appt)
                .await?
                .unwrap_or_else(|| appt.duration_minutes()),
        };
        (start, end_after(start, minutes)?)
    } else if let Some(minutes) = changes.duration_minutes {
        (appt.start_at, end_after(appt.start_at, minutes)?)
    } else {
        (appt.start_at, appt.end_at)
    };

    let interval_changed = start != appt.start_at || end != appt.end_at;
    let staff_changed = target_staff != appt.staff_id;
    let leaving_cancelled = current_status == AppointmentStatus::Cancelled
        && target_status != AppointmentStatus::Cancelled;
    if interval_changed || staff_changed || leaving_cancelled {
        let occupies = target_status.occupies_slot();
        move_appointment(conn, &mut appt, target_staff, start, end, occupies).await?;
    }

    // 3: line items
    if let Some(services) = &new_services {
        appointment_repo::replace_line_items(conn, appt.id, &snapshots(services)).await?;
        appt.total_price = sum_prices(services);
    }

    // 4: explicit total
    if let Some(price) = changes.total_price {
        appt.total_price = price;
    }

    if changes.notes.is_some() {
        appt.notes = normalize_notes(changes.notes.as_ref());
    }

    let mut settlement = None;
    if target_status != current_status {
        appt.status = target_status;
        if target_status == AppointmentStatus::Completed {
            settlement = Some(
                commission::settle(
                    conn,
                    &mut appt,
                    changes.payment_status,
                    changes.payment_method,
                    now_ms,
                )
                .await?,
            );
        }
    }
    if settlement.is_none()
        && let Some(ps) = changes.payment_status
    {
        appt.payment_status = ps;
    }

    // a settled appointment keeps its commission in step with total and staff
    if settlement.is_none()
        && appt.status == AppointmentStatus::Completed
        && (staff_changed || appt.total_price != original_total)
    {
        let commission = commission::recompute(conn, &mut appt).await?;
        tracing::info!(
            tenant_id,
            appointment_id = id,
            staff_id = appt.staff_id,
            total = %appt.total_price,
            commission = %commission,
            "Commission recalculated"
        );
    }

    appointment_repo::save(conn, &appt).await?;
    let appointment = load(conn, tenant_id, id).await?;
    Ok(UpdateOutcome {
        appointment,
        settlement,
    })
}

/// Delete an appointment and its line items
pub async fn remove(conn: &mut SqliteConnection, tenant_id: i64, id: i64) -> SchedulingResult<()> {
    if !appointment_repo::delete(conn, tenant_id, id).await? {
        return Err(SchedulingError::appointment_not_found(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::{payment, shop};
    use chrono::TimeZone;
    use shared::models::{
        CommissionType, NewCustomer, PaymentMethod, PaymentStatus, Role,
    };

    struct Fixture {
        db: DbService,
        tenant_id: i64,
        barber: i64,
        other_barber: i64,
        beard: i64,
        cut: i64,
    }

    async fn fixture() -> Fixture {
        let db = DbService::in_memory().await.unwrap();
        let mut conn = db.pool.acquire().await.unwrap();
        let shop = shop::create(&mut conn, "Fade Factory").await.unwrap();
        let barber = staff::create(
            &mut conn,
            shop.id,
            staff::StaffCreate {
                name: "Ana".into(),
                role: Role::Barber,
                commission_type: Some(CommissionType::Percentage),
                commission_value: Decimal::from(40),
            },
        )
        .await
        .unwrap();
        let other = staff::create(
            &mut conn,
            shop.id,
            staff::StaffCreate {
                name: "Bo".into(),
                role: Role::Barber,
                commission_type: Some(CommissionType::Fixed),
                commission_value: Decimal::from(120),
            },
        )
        .await
        .unwrap();
        let cut = service::create(&mut conn, shop.id, "Cut", Decimal::from(800), 30)
            .await
            .unwrap();
        let beard = service::create(&mut conn, shop.id, "Beard", Decimal::from(500), 20)
            .await
            .unwrap();
        drop(conn);
        Fixture {
            db,
            tenant_id: shop.id,
            barber: barber.id,
            other_barber: other.id,
            beard: beard.id,
            cut: cut.id,
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, h, m, 0).unwrap()
    }

    fn booking(staff_id: i64, services: Vec<i64>, start: DateTime<Utc>) -> AppointmentCreate {
        AppointmentCreate {
            staff_id,
            customer_id: None,
            new_customer: None,
            service_ids: services,
            start_at: start,
            duration_minutes: None,
            total_price: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_derives_end_and_total() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let appt = create(
            &mut conn,
            f.tenant_id,
            &booking(f.barber, vec![f.cut, f.beard], at(9, 0)),
        )
        .await
        .unwrap();

        assert_eq!(appt.end_at, at(9, 50));
        assert_eq!(appt.total_price, Decimal::from(1300));
        assert_eq!(appt.services.len(), 2);
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert_eq!(appt.payment_status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn create_deduplicates_services_and_honours_overrides() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let mut cmd = booking(f.barber, vec![f.cut, f.cut], at(9, 0));
        cmd.duration_minutes = Some(45);
        cmd.total_price = Some(Decimal::new(99950, 2));

        let appt = create(&mut conn, f.tenant_id, &cmd).await.unwrap();
        assert_eq!(appt.services.len(), 1);
        assert_eq!(appt.end_at, at(9, 45));
        assert_eq!(appt.total_price, Decimal::new(99950, 2));
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();

        let err = create(&mut conn, f.tenant_id, &booking(f.barber, vec![], at(9, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmptyServiceSet);

        let err = create(&mut conn, f.tenant_id, &booking(f.barber, vec![424242], at(9, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");

        let mut cmd = booking(f.barber, vec![f.cut], at(9, 0));
        cmd.duration_minutes = Some(0);
        assert_eq!(
            create(&mut conn, f.tenant_id, &cmd).await.unwrap_err().code(),
            ErrorCode::InvalidDuration
        );

        let mut cmd = booking(f.barber, vec![f.cut], at(9, 0));
        cmd.total_price = Some(Decimal::ZERO);
        assert_eq!(
            create(&mut conn, f.tenant_id, &cmd).await.unwrap_err().code(),
            ErrorCode::InvalidAmount
        );

        let mut cmd = booking(f.barber, vec![f.cut], at(9, 0));
        cmd.new_customer = Some(NewCustomer {
            name: "  ".into(),
            phone: None,
            notes: None,
        });
        assert_eq!(
            create(&mut conn, f.tenant_id, &cmd).await.unwrap_err().code(),
            ErrorCode::CustomerNameRequired
        );

        let err = create(&mut conn, f.tenant_id, &booking(777, vec![f.cut], at(9, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(err.code(), ErrorCode::StaffNotFound);
    }

    #[tokio::test]
    async fn inactive_service_is_not_bookable() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        service::set_active(&mut conn, f.tenant_id, f.beard, false).await.unwrap();

        let err = create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.beard], at(9, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ServiceInactive);
    }

    #[tokio::test]
    async fn new_customer_is_created_with_booking() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let mut cmd = booking(f.barber, vec![f.cut], at(9, 0));
        cmd.new_customer = Some(NewCustomer {
            name: "Carlos".into(),
            phone: Some("555-0100".into()),
            notes: None,
        });

        let appt = create(&mut conn, f.tenant_id, &cmd).await.unwrap();
        let customer_id = appt.customer_id.unwrap();
        let c = customer::find_by_id(&mut conn, f.tenant_id, customer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(c.name, "Carlos");
        assert!(c.last_visit_at.is_none());
    }

    #[tokio::test]
    async fn conflicting_create_leaves_store_unchanged() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.cut], at(10, 0)))
            .await
            .unwrap();

        let mut cmd = booking(f.barber, vec![f.cut], at(10, 15));
        cmd.new_customer = Some(NewCustomer {
            name: "Dana".into(),
            phone: None,
            notes: None,
        });
        let err = create(&mut conn, f.tenant_id, &cmd).await.unwrap_err();
        assert_eq!(err.kind(), "conflict");

        let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(customers, 0);

        // another barber is free at the same time
        create(&mut conn, f.tenant_id, &booking(f.other_barber, vec![f.cut], at(10, 15)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reschedule_onto_taken_slot_keeps_original_time() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.cut], at(10, 0)))
            .await
            .unwrap();
        let b = create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.cut], at(11, 0)))
            .await
            .unwrap();

        let err = reschedule(&mut conn, f.tenant_id, b.id, at(10, 15), at(10, 45))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "conflict");
        let b_now = load(&mut conn, f.tenant_id, b.id).await.unwrap();
        assert_eq!(b_now.start_at, at(11, 0));

        let err = reschedule(&mut conn, f.tenant_id, b.id, at(12, 0), at(12, 0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTimeRange);

        let moved = reschedule(&mut conn, f.tenant_id, b.id, at(10, 30), at(11, 0))
            .await
            .unwrap();
        assert_eq!(moved.start_at, at(10, 30));
    }

    #[tokio::test]
    async fn update_start_uses_attached_service_durations() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let mut cmd = booking(f.barber, vec![f.cut, f.beard], at(9, 0));
        cmd.duration_minutes = Some(90);
        let appt = create(&mut conn, f.tenant_id, &cmd).await.unwrap();

        let changes = AppointmentUpdate {
            start_at: Some(at(14, 0)),
            ..Default::default()
        };
        let out = update(&mut conn, f.tenant_id, appt.id, &changes, 0).await.unwrap();
        assert_eq!(out.appointment.start_at, at(14, 0));
        assert_eq!(out.appointment.end_at, at(14, 50));
    }

    #[tokio::test]
    async fn update_duration_only_keeps_start() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let appt = create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.cut], at(9, 0)))
            .await
            .unwrap();

        let changes = AppointmentUpdate {
            duration_minutes: Some(60),
            ..Default::default()
        };
        let out = update(&mut conn, f.tenant_id, appt.id, &changes, 0).await.unwrap();
        assert_eq!(out.appointment.start_at, at(9, 0));
        assert_eq!(out.appointment.end_at, at(10, 0));
    }

    #[tokio::test]
    async fn update_services_reprices_unless_price_given() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let appt = create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.cut], at(9, 0)))
            .await
            .unwrap();

        let changes = AppointmentUpdate {
            service_ids: Some(vec![f.beard]),
            ..Default::default()
        };
        let out = update(&mut conn, f.tenant_id, appt.id, &changes, 0).await.unwrap();
        assert_eq!(out.appointment.total_price, Decimal::from(500));
        assert_eq!(out.appointment.services[0].service_id, f.beard);
        // end only moves with start or duration
        assert_eq!(out.appointment.end_at, at(9, 30));

        let changes = AppointmentUpdate {
            service_ids: Some(vec![f.cut, f.beard]),
            total_price: Some(Decimal::from(1100)),
            ..Default::default()
        };
        let out = update(&mut conn, f.tenant_id, appt.id, &changes, 0).await.unwrap();
        assert_eq!(out.appointment.total_price, Decimal::from(1100));
        assert_eq!(out.appointment.services.len(), 2);
    }

    #[tokio::test]
    async fn update_staff_change_is_conflict_checked() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        create(&mut conn, f.tenant_id, &booking(f.other_barber, vec![f.cut], at(9, 0)))
            .await
            .unwrap();
        let appt = create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.cut], at(9, 0)))
            .await
            .unwrap();

        let changes = AppointmentUpdate {
            staff_id: Some(f.other_barber),
            ..Default::default()
        };
        let err = update(&mut conn, f.tenant_id, appt.id, &changes, 0).await.unwrap_err();
        assert_eq!(err.kind(), "conflict");

        let changes = AppointmentUpdate {
            staff_id: Some(123),
            ..Default::default()
        };
        let err = update(&mut conn, f.tenant_id, appt.id, &changes, 0).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StaffNotFound);
    }

    #[tokio::test]
    async fn revived_appointment_rechecks_slot() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let a = create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.cut], at(10, 0)))
            .await
            .unwrap();
        let cancel = AppointmentUpdate {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };
        update(&mut conn, f.tenant_id, a.id, &cancel, 0).await.unwrap();

        // slot freed
        create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.cut], at(10, 0)))
            .await
            .unwrap();

        let revive = AppointmentUpdate {
            status: Some(AppointmentStatus::Scheduled),
            ..Default::default()
        };
        let err = update(&mut conn, f.tenant_id, a.id, &revive, 0).await.unwrap_err();
        assert_eq!(err.kind(), "conflict");
        assert_eq!(
            load(&mut conn, f.tenant_id, a.id).await.unwrap().status,
            AppointmentStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn completion_settles_once() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let mut cmd = booking(f.barber, vec![f.cut, f.beard], at(9, 0));
        cmd.new_customer = Some(NewCustomer {
            name: "Eli".into(),
            phone: None,
            notes: None,
        });
        let appt = create(&mut conn, f.tenant_id, &cmd).await.unwrap();

        let complete = AppointmentUpdate {
            status: Some(AppointmentStatus::Completed),
            payment_status: Some(PaymentStatus::Paid),
            payment_method: Some(PaymentMethod::Card),
            ..Default::default()
        };
        let out = update(&mut conn, f.tenant_id, appt.id, &complete, 1_704_880_000_000)
            .await
            .unwrap();
        let settlement = out.settlement.unwrap();
        assert_eq!(settlement.commission, Decimal::new(52000, 2));
        assert!(settlement.customer_stamped);
        assert_eq!(out.appointment.commission_amount, Decimal::from(520));
        assert_eq!(out.appointment.payment_status, PaymentStatus::Paid);

        let again = update(&mut conn, f.tenant_id, appt.id, &complete, 1_704_880_100_000)
            .await
            .unwrap();
        assert!(again.settlement.is_none());

        let payments = payment::list_by_appointment(&mut conn, f.tenant_id, appt.id)
            .await
            .unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, Decimal::from(1300));
        assert_eq!(payments[0].method, PaymentMethod::Card);

        let customer = customer::find_by_id(&mut conn, f.tenant_id, appt.customer_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.last_visit_at, Some(1_704_880_000_000));
    }

    #[tokio::test]
    async fn completed_is_terminal() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let appt = create(&mut conn, f.tenant_id, &booking(f.other_barber, vec![f.cut], at(9, 0)))
            .await
            .unwrap();
        let complete = AppointmentUpdate {
            status: Some(AppointmentStatus::Completed),
            ..Default::default()
        };
        let out = update(&mut conn, f.tenant_id, appt.id, &complete, 0).await.unwrap();
        assert_eq!(out.appointment.commission_amount, Decimal::from(120));
        assert_eq!(out.appointment.payment_status, PaymentStatus::Unpaid);

        let cancel = AppointmentUpdate {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };
        let err = update(&mut conn, f.tenant_id, appt.id, &cancel, 0).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStatusTransition);
    }

    #[tokio::test]
    async fn editing_completed_appointment_recalculates_commission() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let appt = create(
            &mut conn,
            f.tenant_id,
            &booking(f.barber, vec![f.cut, f.beard], at(9, 0)),
        )
        .await
        .unwrap();
        let complete = AppointmentUpdate {
            status: Some(AppointmentStatus::Completed),
            payment_status: Some(PaymentStatus::Paid),
            ..Default::default()
        };
        let out = update(&mut conn, f.tenant_id, appt.id, &complete, 0).await.unwrap();
        assert_eq!(out.appointment.commission_amount, Decimal::from(520));

        let discount = AppointmentUpdate {
            total_price: Some(Decimal::from(100)),
            ..Default::default()
        };
        let out = update(&mut conn, f.tenant_id, appt.id, &discount, 0).await.unwrap();
        assert!(out.settlement.is_none());
        assert_eq!(out.appointment.total_price, Decimal::from(100));
        assert_eq!(out.appointment.commission_amount, Decimal::from(40));
        assert_eq!(out.appointment.commission_amount.to_string(), "40.00");

        // fixed 120 is clamped to the 100 total
        let reassign = AppointmentUpdate {
            staff_id: Some(f.other_barber),
            ..Default::default()
        };
        let out = update(&mut conn, f.tenant_id, appt.id, &reassign, 0).await.unwrap();
        assert_eq!(out.appointment.staff_id, f.other_barber);
        assert_eq!(out.appointment.commission_amount, Decimal::from(100));

        // still one payment record; recalculation has no settlement side effects
        let payments = payment::list_by_appointment(&mut conn, f.tenant_id, appt.id)
            .await
            .unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[tokio::test]
    async fn catalog_price_change_does_not_touch_bookings() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let appt = create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.cut], at(9, 0)))
            .await
            .unwrap();
        service::update_price(&mut conn, f.tenant_id, f.cut, Decimal::from(950))
            .await
            .unwrap();

        let after = load(&mut conn, f.tenant_id, appt.id).await.unwrap();
        assert_eq!(after.total_price, Decimal::from(800));
        assert_eq!(after.services[0].price_at_time, Decimal::from(800));
    }

    #[tokio::test]
    async fn remove_unknown_is_not_found() {
        let f = fixture().await;
        let mut conn = f.db.pool.acquire().await.unwrap();
        let appt = create(&mut conn, f.tenant_id, &booking(f.barber, vec![f.cut], at(9, 0)))
            .await
            .unwrap();
        remove(&mut conn, f.tenant_id, appt.id).await.unwrap();
        let err = remove(&mut conn, f.tenant_id, appt.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AppointmentNotFound);
    }
}
