//! Caller identity and authorization rules
//!
//! Owners and super admins act on any appointment of their shop. Barbers
//! act only on their own calendar: they cannot book for, reassign to, or
//! touch appointments of another staff member.

use super::error::{SchedulingError, SchedulingResult};
use crate::db::repository::shop;
use shared::error::ErrorCode;
use shared::models::{Appointment, Role};
use sqlx::SqliteConnection;

/// Authenticated caller, scoped to one shop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// User id; for barbers this is their staff id
    pub user_id: i64,
    pub tenant_id: i64,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: i64, tenant_id: i64, role: Role) -> Self {
        Self {
            user_id,
            tenant_id,
            role,
        }
    }

    /// Staff id a barber is confined to, `None` for shop managers
    pub fn own_staff_scope(&self) -> Option<i64> {
        match self.role {
            Role::Barber => Some(self.user_id),
            Role::Owner | Role::SuperAdmin => None,
        }
    }
}

/// Caller may put an appointment on `staff_id`'s calendar
pub fn authorize_staff(caller: &Caller, staff_id: i64) -> SchedulingResult<()> {
    match caller.own_staff_scope() {
        Some(own) if own != staff_id => {
            crate::security_log!(
                "WARN",
                "staff_scope_denied",
                user_id = caller.user_id,
                tenant_id = caller.tenant_id,
                staff_id = staff_id
            );
            Err(SchedulingError::forbidden(
                ErrorCode::StaffScopeViolation,
                "Barbers may only book or move appointments on their own calendar",
            ))
        }
        _ => Ok(()),
    }
}

/// Caller may read or change `appt`
pub fn authorize_appointment(caller: &Caller, appt: &Appointment) -> SchedulingResult<()> {
    match caller.own_staff_scope() {
        Some(own) if own != appt.staff_id => {
            crate::security_log!(
                "WARN",
                "appointment_access_denied",
                user_id = caller.user_id,
                tenant_id = caller.tenant_id,
                appointment_id = appt.id
            );
            Err(SchedulingError::forbidden(
                ErrorCode::StaffScopeViolation,
                "Barbers may only manage their own appointments",
            ))
        }
        _ => Ok(()),
    }
}

/// The caller's shop must exist and be active
pub async fn ensure_shop_active(
    conn: &mut SqliteConnection,
    tenant_id: i64,
) -> SchedulingResult<()> {
    match shop::find_by_id(conn, tenant_id).await? {
        Some(s) if s.is_active => Ok(()),
        Some(_) => Err(SchedulingError::forbidden(
            ErrorCode::TenantInactive,
            format!("Shop {tenant_id} is not active"),
        )),
        None => Err(SchedulingError::forbidden(
            ErrorCode::TenantNotFound,
            format!("Shop {tenant_id} not found"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use shared::models::{AppointmentStatus, PaymentStatus};

    fn appt(staff_id: i64) -> Appointment {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        Appointment {
            id: 1,
            tenant_id: 10,
            staff_id,
            customer_id: None,
            start_at: start,
            end_at: start + chrono::Duration::minutes(30),
            status: AppointmentStatus::Scheduled,
            payment_status: PaymentStatus::Unpaid,
            total_price: Decimal::from(800),
            commission_amount: Decimal::ZERO,
            notes: None,
            services: vec![],
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn barber_is_confined_to_own_calendar() {
        let barber = Caller::new(7, 10, Role::Barber);
        assert!(authorize_staff(&barber, 7).is_ok());
        let err = authorize_staff(&barber, 8).unwrap_err();
        assert_eq!(err.kind(), "authorization");

        assert!(authorize_appointment(&barber, &appt(7)).is_ok());
        assert!(authorize_appointment(&barber, &appt(8)).is_err());
    }

    #[test]
    fn owner_manages_whole_shop() {
        let owner = Caller::new(1, 10, Role::Owner);
        assert!(authorize_staff(&owner, 8).is_ok());
        assert!(authorize_appointment(&owner, &appt(8)).is_ok());

        let admin = Caller::new(2, 10, Role::SuperAdmin);
        assert_eq!(admin.own_staff_scope(), None);
    }
}
