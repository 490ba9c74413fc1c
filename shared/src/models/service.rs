//! Service Model (catalog entry)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bookable service of a shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: i64,
    pub is_active: bool,
}
