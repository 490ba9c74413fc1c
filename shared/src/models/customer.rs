//! Customer Model

use serde::{Deserialize, Serialize};

/// Customer entity (shop-scoped)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    /// Stamped when an appointment is completed (UTC millis)
    pub last_visit_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Customer created while booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
