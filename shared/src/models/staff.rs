//! Staff Model

use super::UnknownVariant;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Platform role of an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Owner,
    Barber,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Owner => "owner",
            Self::Barber => "barber",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "owner" => Ok(Self::Owner),
            "barber" => Ok(Self::Barber),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

/// How a staff member is paid per completed appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionType {
    /// `value` percent of the appointment total
    Percentage,
    /// Flat `value` per appointment
    Fixed,
}

impl CommissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }
}

impl FromStr for CommissionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            other => Err(UnknownVariant::new("commission type", other)),
        }
    }
}

/// Commission agreement of a staff member
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionTerms {
    pub commission_type: Option<CommissionType>,
    pub value: Decimal,
}

impl CommissionTerms {
    pub fn none() -> Self {
        Self {
            commission_type: None,
            value: Decimal::ZERO,
        }
    }
}

/// Staff member entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub role: Role,
    pub commission_type: Option<CommissionType>,
    pub commission_value: Decimal,
    pub is_active: bool,
}

impl StaffMember {
    pub fn commission_terms(&self) -> CommissionTerms {
        CommissionTerms {
            commission_type: self.commission_type,
            value: self.commission_value,
        }
    }
}
