//! Scheduling facade
//!
//! The entry point HTTP handlers call. Every write runs as
//! shop check → authorization → staff lock → transaction → ledger → commit.

use super::access::{self, Caller};
use super::error::{SchedulingError, SchedulingResult};
use super::ledger;
use super::lock::{StaffLockGuard, StaffLocks};
use crate::db::repository::{appointment as appointment_repo, payment};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_required_text};
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{
    Appointment, AppointmentCreate, AppointmentFilter, AppointmentReschedule, AppointmentStatus,
    AppointmentStatusChange, AppointmentUpdate, Payment, PaymentRecordStatus, PaymentStatus,
    PendingPaymentCreate,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;

/// Result of a card payment confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPaymentOutcome {
    Settled { payment_id: i64, appointment_id: i64 },
    AlreadySettled { payment_id: i64, appointment_id: i64 },
    /// No payment carries the intent id
    Unmatched,
}

/// Attempts to pin an appointment's staff lock when the staff keeps changing
const LOCK_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct SchedulingService {
    pool: SqlitePool,
    locks: Arc<StaffLocks>,
}

/// An appointment loaded under its staff lock, inside an open transaction.
/// Field order matters: the transaction drops before the lock is released.
struct Locked {
    tx: Transaction<'static, Sqlite>,
    appointment: Appointment,
    _guard: StaffLockGuard,
}

impl SchedulingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: Arc::new(StaffLocks::new()),
        }
    }

    /// Open a write transaction holding SQLite's write lock from the start.
    ///
    /// A deferred transaction that reads first cannot be upgraded once
    /// another connection has committed (`SQLITE_BUSY_SNAPSHOT`), and the
    /// busy timeout does not retry that case. `BEGIN IMMEDIATE` waits on the
    /// busy timeout instead, so writers on different calendars queue up.
    async fn begin_write(&self) -> SchedulingResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Shop check on a short-lived connection, released before any lock wait
    async fn check_shop(&self, caller: &Caller) -> SchedulingResult<()> {
        let mut conn = self.pool.acquire().await?;
        access::ensure_shop_active(&mut conn, caller.tenant_id).await
    }

    /// Lock the calendar(s) an appointment lives on, then load it in a
    /// transaction. Retries if the appointment moved to another staff
    /// member between the peek and the lock.
    async fn lock_appointment(
        &self,
        tenant_id: i64,
        id: i64,
        target_staff: Option<i64>,
    ) -> SchedulingResult<Locked> {
        for attempt in 1..=LOCK_ATTEMPTS {
            let current_staff = {
                let mut conn = self.pool.acquire().await?;
                appointment_repo::find_by_id(&mut conn, tenant_id, id)
                    .await?
                    .ok_or_else(|| SchedulingError::appointment_not_found(id))?
                    .staff_id
            };

            let mut staff_ids = vec![current_staff];
            staff_ids.extend(target_staff);
            let guard = self.locks.acquire(tenant_id, &staff_ids).await;

            let mut tx = self.begin_write().await?;
            let appointment = appointment_repo::find_by_id(&mut tx, tenant_id, id)
                .await?
                .ok_or_else(|| SchedulingError::appointment_not_found(id))?;

            if appointment.staff_id == current_staff {
                return Ok(Locked {
                    tx,
                    appointment,
                    _guard: guard,
                });
            }
            tracing::debug!(appointment_id = id, attempt, "Staff changed while locking, retrying");
        }
        Err(SchedulingError::conflict(
            ErrorCode::AppointmentConflict,
            "Appointment is being modified concurrently, please retry",
        ))
    }

    /// Book a new appointment
    pub async fn book_appointment(
        &self,
        caller: &Caller,
        cmd: AppointmentCreate,
    ) -> SchedulingResult<Appointment> {
        let result: SchedulingResult<Appointment> = async {
            self.check_shop(caller).await?;
            access::authorize_staff(caller, cmd.staff_id)?;

            let _guard = self.locks.acquire(caller.tenant_id, &[cmd.staff_id]).await;
            let mut tx = self.begin_write().await?;
            let appt = ledger::create(&mut tx, caller.tenant_id, &cmd).await?;
            tx.commit().await?;
            Ok(appt)
        }
        .await;

        log_outcome("book", caller, None, &result);
        result
    }

    /// Move an appointment in time on its current staff member's calendar
    pub async fn move_appointment(
        &self,
        caller: &Caller,
        id: i64,
        to: AppointmentReschedule,
    ) -> SchedulingResult<Appointment> {
        let result: SchedulingResult<Appointment> = async {
            self.check_shop(caller).await?;
            let mut locked = self.lock_appointment(caller.tenant_id, id, None).await?;
            access::authorize_appointment(caller, &locked.appointment)?;

            let appt =
                ledger::reschedule(&mut locked.tx, caller.tenant_id, id, to.start_at, to.end_at)
                    .await?;
            locked.tx.commit().await?;
            Ok(appt)
        }
        .await;

        log_outcome("move", caller, Some(id), &result);
        result
    }

    /// Partial update, including status transitions and settlement
    pub async fn edit_appointment(
        &self,
        caller: &Caller,
        id: i64,
        changes: AppointmentUpdate,
    ) -> SchedulingResult<Appointment> {
        let result: SchedulingResult<Appointment> = async {
            self.check_shop(caller).await?;
            if let Some(staff_id) = changes.staff_id {
                access::authorize_staff(caller, staff_id)?;
            }
            let mut locked = self
                .lock_appointment(caller.tenant_id, id, changes.staff_id)
                .await?;
            access::authorize_appointment(caller, &locked.appointment)?;

            let now = shared::util::now_millis();
            let outcome =
                ledger::update(&mut locked.tx, caller.tenant_id, id, &changes, now).await?;
            locked.tx.commit().await?;

            if let Some(settlement) = &outcome.settlement {
                tracing::info!(
                    tenant_id = caller.tenant_id,
                    appointment_id = id,
                    commission = %settlement.commission,
                    payment_id = settlement.payment.as_ref().map(|p| p.id),
                    "Appointment completed"
                );
            }
            Ok(outcome.appointment)
        }
        .await;

        log_outcome("edit", caller, Some(id), &result);
        result
    }

    /// Status transition, optionally recording payment on completion
    pub async fn change_status(
        &self,
        caller: &Caller,
        id: i64,
        change: AppointmentStatusChange,
    ) -> SchedulingResult<Appointment> {
        self.edit_appointment(caller, id, change.into()).await
    }

    /// Cancel; the record stays and its slot is freed
    pub async fn cancel_appointment(
        &self,
        caller: &Caller,
        id: i64,
    ) -> SchedulingResult<Appointment> {
        self.change_status(
            caller,
            id,
            AppointmentStatusChange {
                status: AppointmentStatus::Cancelled,
                payment_status: None,
                payment_method: None,
            },
        )
        .await
    }

    /// Permanently delete an appointment with its line items and payments
    pub async fn delete_appointment(&self, caller: &Caller, id: i64) -> SchedulingResult<()> {
        let result: SchedulingResult<()> = async {
            self.check_shop(caller).await?;
            let mut locked = self.lock_appointment(caller.tenant_id, id, None).await?;
            access::authorize_appointment(caller, &locked.appointment)?;

            ledger::remove(&mut locked.tx, caller.tenant_id, id).await?;
            locked.tx.commit().await?;
            Ok(())
        }
        .await;

        log_outcome("delete", caller, Some(id), &result);
        result
    }

    pub async fn get_appointment(&self, caller: &Caller, id: i64) -> SchedulingResult<Appointment> {
        let mut conn = self.pool.acquire().await?;
        access::ensure_shop_active(&mut conn, caller.tenant_id).await?;
        let appt = appointment_repo::find_by_id(&mut conn, caller.tenant_id, id)
            .await?
            .ok_or_else(|| SchedulingError::appointment_not_found(id))?;
        access::authorize_appointment(caller, &appt)?;
        Ok(appt)
    }

    /// Calendar feed; barbers only ever see their own column
    pub async fn list_appointments(
        &self,
        caller: &Caller,
        mut filter: AppointmentFilter,
    ) -> SchedulingResult<Vec<Appointment>> {
        if let Some(own) = caller.own_staff_scope() {
            filter.staff_id = Some(own);
        }
        let mut conn = self.pool.acquire().await?;
        access::ensure_shop_active(&mut conn, caller.tenant_id).await?;
        Ok(appointment_repo::list(&mut conn, caller.tenant_id, &filter).await?)
    }

    /// Register a card payment intent for the appointment's total; the
    /// webhook settles it later
    pub async fn register_pending_payment(
        &self,
        caller: &Caller,
        id: i64,
        req: PendingPaymentCreate,
    ) -> SchedulingResult<Payment> {
        let result: SchedulingResult<Payment> = async {
            validate_required_text(
                &req.payment_intent_id,
                "payment_intent_id",
                MAX_SHORT_TEXT_LEN,
            )?;
            self.check_shop(caller).await?;
            let mut locked = self.lock_appointment(caller.tenant_id, id, None).await?;
            access::authorize_appointment(caller, &locked.appointment)?;

            let total = locked.appointment.total_price;
            if total <= Decimal::ZERO {
                return Err(SchedulingError::validation(
                    ErrorCode::InvalidAmount,
                    "Appointment total must be positive to take a card payment",
                ));
            }
            let pending = payment::upsert_pending(
                &mut locked.tx,
                caller.tenant_id,
                id,
                total,
                req.payment_intent_id.trim(),
            )
            .await?;
            appointment_repo::set_payment_status(
                &mut locked.tx,
                caller.tenant_id,
                id,
                PaymentStatus::Pending,
            )
            .await?;
            locked.tx.commit().await?;
            Ok(pending)
        }
        .await;

        log_outcome("register_payment", caller, Some(id), &result);
        result
    }

    /// Settle the card payment registered under `payment_intent_id`: the
    /// payment becomes `succeeded` and the appointment `paid`. Repeated
    /// deliveries are no-ops.
    pub async fn settle_card_payment(
        &self,
        payment_intent_id: &str,
        paid_at: i64,
    ) -> SchedulingResult<CardPaymentOutcome> {
        let found = {
            let mut conn = self.pool.acquire().await?;
            payment::find_by_intent(&mut conn, payment_intent_id).await?
        };
        let Some(found) = found else {
            return Ok(CardPaymentOutcome::Unmatched);
        };

        let mut locked = self
            .lock_appointment(found.tenant_id, found.appointment_id, None)
            .await?;
        let current = payment::find_by_id(&mut locked.tx, found.id)
            .await?
            .ok_or_else(|| {
                SchedulingError::not_found(
                    ErrorCode::PaymentNotFound,
                    format!("Payment {} not found", found.id),
                )
            })?;
        if current.status == PaymentRecordStatus::Succeeded {
            return Ok(CardPaymentOutcome::AlreadySettled {
                payment_id: current.id,
                appointment_id: current.appointment_id,
            });
        }

        payment::mark_succeeded(&mut locked.tx, current.id, paid_at).await?;
        appointment_repo::set_payment_status(
            &mut locked.tx,
            current.tenant_id,
            current.appointment_id,
            PaymentStatus::Paid,
        )
        .await?;
        locked.tx.commit().await?;

        tracing::info!(
            tenant_id = current.tenant_id,
            appointment_id = current.appointment_id,
            payment_id = current.id,
            amount = %current.amount,
            "Card payment settled"
        );
        Ok(CardPaymentOutcome::Settled {
            payment_id: current.id,
            appointment_id: current.appointment_id,
        })
    }
}

/// Conflicts and rejected input are WARN, storage failures ERROR
fn log_outcome<T>(op: &str, caller: &Caller, id: Option<i64>, result: &SchedulingResult<T>) {
    let Err(err) = result else {
        tracing::info!(
            op,
            tenant_id = caller.tenant_id,
            user_id = caller.user_id,
            appointment_id = id,
            "Scheduling operation succeeded"
        );
        return;
    };
    match err {
        SchedulingError::Persistence(msg) => tracing::error!(
            op,
            tenant_id = caller.tenant_id,
            appointment_id = id,
            error = %msg,
            "Scheduling operation failed"
        ),
        SchedulingError::Authorization { .. } => {}
        other => tracing::warn!(
            op,
            tenant_id = caller.tenant_id,
            appointment_id = id,
            kind = other.kind(),
            code = %other.code(),
            error = %other,
            "Scheduling operation rejected"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::{service, shop, staff};
    use chrono::{DateTime, TimeZone, Utc};
    use shared::models::{CommissionType, Role};

    async fn setup() -> (SchedulingService, Caller, i64, i64) {
        let db = DbService::in_memory().await.unwrap();
        let mut conn = db.pool.acquire().await.unwrap();
        let shop = shop::create(&mut conn, "Clip Joint").await.unwrap();
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
        let cut = service::create(&mut conn, shop.id, "Cut", Decimal::from(800), 30)
            .await
            .unwrap();
        drop(conn);
        let owner = Caller::new(1, shop.id, Role::Owner);
        (SchedulingService::new(db.pool), owner, barber.id, cut.id)
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, h, m, 0).unwrap()
    }

    fn booking(staff_id: i64, service_id: i64, start: DateTime<Utc>) -> AppointmentCreate {
        AppointmentCreate {
            staff_id,
            customer_id: None,
            new_customer: None,
            service_ids: vec![service_id],
            start_at: start,
            duration_minutes: None,
            total_price: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn cancel_frees_the_slot() {
        let (svc, owner, barber, cut) = setup().await;
        let a = svc.book_appointment(&owner, booking(barber, cut, at(10, 0))).await.unwrap();
        assert!(svc.book_appointment(&owner, booking(barber, cut, at(10, 0))).await.is_err());

        let cancelled = svc.cancel_appointment(&owner, a.id).await.unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        svc.book_appointment(&owner, booking(barber, cut, at(10, 0))).await.unwrap();
    }

    #[tokio::test]
    async fn barber_cannot_touch_colleagues() {
        let (svc, owner, barber, cut) = setup().await;
        let a = svc.book_appointment(&owner, booking(barber, cut, at(10, 0))).await.unwrap();

        let colleague = Caller::new(barber + 1, owner.tenant_id, Role::Barber);
        let err = svc.get_appointment(&colleague, a.id).await.unwrap_err();
        assert_eq!(err.kind(), "authorization");
        let err = svc
            .book_appointment(&colleague, booking(barber, cut, at(12, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::StaffScopeViolation);

        let listed = svc
            .list_appointments(&colleague, AppointmentFilter::default())
            .await
            .unwrap();
        assert!(listed.is_empty());

        let me = Caller::new(barber, owner.tenant_id, Role::Barber);
        let own = svc
            .list_appointments(&me, AppointmentFilter::default())
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
    }

    #[tokio::test]
    async fn pending_payment_is_reused_per_appointment() {
        let (svc, owner, barber, cut) = setup().await;
        let a = svc.book_appointment(&owner, booking(barber, cut, at(10, 0))).await.unwrap();

        let intent = |id: &str| PendingPaymentCreate {
            payment_intent_id: id.into(),
        };
        let first = svc
            .register_pending_payment(&owner, a.id, intent("pi_1"))
            .await
            .unwrap();
        let second = svc
            .register_pending_payment(&owner, a.id, intent("pi_2"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.payment_intent_id.as_deref(), Some("pi_2"));
        assert_eq!(second.amount, Decimal::from(800));

        let appt = svc.get_appointment(&owner, a.id).await.unwrap();
        assert_eq!(appt.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn lock_entries_are_released_after_writes() {
        let (svc, owner, barber, cut) = setup().await;
        let a = svc
            .book_appointment(&owner, booking(barber, cut, at(10, 0)))
            .await
            .unwrap();
        assert!(svc.locks.is_empty());

        let to = AppointmentReschedule {
            start_at: at(11, 0),
            end_at: at(11, 30),
        };
        svc.move_appointment(&owner, a.id, to).await.unwrap();
        svc.cancel_appointment(&owner, a.id).await.unwrap();
        // failed writes release too
        assert!(svc.delete_appointment(&owner, a.id + 1).await.is_err());
        assert!(svc.locks.is_empty());
    }

    #[tokio::test]
    async fn inactive_shop_rejects_everything() {
        let (svc, owner, barber, cut) = setup().await;
        {
            let mut conn = svc.pool.acquire().await.unwrap();
            shop::set_active(&mut conn, owner.tenant_id, false).await.unwrap();
        }
        let err = svc
            .book_appointment(&owner, booking(barber, cut, at(10, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TenantInactive);
        let err = svc
            .list_appointments(&owner, AppointmentFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "authorization");
    }
}
