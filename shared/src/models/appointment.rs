//! Appointment Model

use super::UnknownVariant;
use super::customer::NewCustomer;
use super::payment::PaymentMethod;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Appointment lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a change from `self` to `next` is permitted.
    ///
    /// Same-state writes are always permitted (they are no-ops).
    /// A completed appointment is terminal.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Scheduled, Scheduled)
                | (Completed, Completed)
                | (Cancelled, Cancelled)
                | (Scheduled, Completed)
                | (Scheduled, Cancelled)
                | (Cancelled, Scheduled)
                | (Cancelled, Completed)
        )
    }

    /// Non-cancelled appointments occupy the staff member's time.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl FromStr for AppointmentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant::new("appointment status", other)),
        }
    }
}

/// Payment state of an appointment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Pending,
    Paid,
    SemiPaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::SemiPaid => "semi-paid",
        }
    }

    /// Settling with this status records a payment entry
    pub fn records_payment(&self) -> bool {
        matches!(self, Self::Paid | Self::SemiPaid)
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "semi-paid" => Ok(Self::SemiPaid),
            other => Err(UnknownVariant::new("payment status", other)),
        }
    }
}

/// Line item: a service booked on an appointment with its price snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentService {
    pub service_id: i64,
    pub name: String,
    pub price_at_time: Decimal,
}

/// Appointment entity with its line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub tenant_id: i64,
    pub staff_id: i64,
    pub customer_id: Option<i64>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub total_price: Decimal,
    pub commission_amount: Decimal,
    pub notes: Option<String>,
    #[serde(default)]
    pub services: Vec<AppointmentService>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Appointment {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_at - self.start_at).num_minutes()
    }
}

/// Who the appointment is for
#[derive(Debug, Clone, PartialEq)]
pub enum CustomerRef {
    /// No customer attached (walk-in)
    None,
    /// Existing customer of the shop
    Existing(i64),
    /// Created in the booking transaction
    New(NewCustomer),
}

/// Create appointment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentCreate {
    pub staff_id: i64,
    #[serde(default)]
    pub customer_id: Option<i64>,
    /// Creates a customer on the fly when `customer_id` is absent
    #[serde(default)]
    pub new_customer: Option<NewCustomer>,
    pub service_ids: Vec<i64>,
    pub start_at: DateTime<Utc>,
    /// Overrides the summed service durations
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    /// Overrides the summed service prices
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AppointmentCreate {
    pub fn customer_ref(&self) -> CustomerRef {
        match (self.customer_id, &self.new_customer) {
            (Some(id), _) => CustomerRef::Existing(id),
            (None, Some(new)) => CustomerRef::New(new.clone()),
            (None, None) => CustomerRef::None,
        }
    }
}

/// Partial update payload; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentUpdate {
    #[serde(default)]
    pub staff_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub service_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

/// Move payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentReschedule {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentStatusChange {
    pub status: AppointmentStatus,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl From<AppointmentStatusChange> for AppointmentUpdate {
    fn from(change: AppointmentStatusChange) -> Self {
        Self {
            status: Some(change.status),
            payment_status: change.payment_status,
            payment_method: change.payment_method,
            ..Default::default()
        }
    }
}

/// Calendar query (all filters optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilter {
    /// Start time lower bound (inclusive)
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Start time upper bound (exclusive)
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub staff_id: Option<i64>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Register a card payment intent created by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPaymentCreate {
    pub payment_intent_id: String,
}
