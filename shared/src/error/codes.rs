//! Unified error codes for the salon platform
//!
//! This module defines all error codes returned by salon-server and consumed by the
//! booking UIs. Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Tenant (shop) errors
//! - 4xxx: Appointment errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors
//! - 8xxx: Staff / customer errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Barber tried to act on another staff member's calendar
    StaffScopeViolation = 2003,

    // ==================== 3xxx: Tenant ====================
    /// Tenant not selected
    TenantNotSelected = 3001,
    /// Tenant not found
    TenantNotFound = 3002,
    /// Shop is deactivated
    TenantInactive = 3003,

    // ==================== 4xxx: Appointment ====================
    /// Appointment not found
    AppointmentNotFound = 4001,
    /// Time slot already booked for the staff member
    AppointmentConflict = 4002,
    /// End time is not after start time
    InvalidTimeRange = 4003,
    /// Status change not allowed from the current status
    InvalidStatusTransition = 4004,
    /// Appointment already completed
    AppointmentAlreadyCompleted = 4005,
    /// No services selected
    EmptyServiceSet = 4006,
    /// Duration must be positive
    InvalidDuration = 4007,

    // ==================== 5xxx: Payment ====================
    /// Payment failed
    PaymentFailed = 5001,
    /// Payment record not found
    PaymentNotFound = 5002,
    /// Amount is invalid
    InvalidAmount = 5003,
    /// Unsupported payment method
    PaymentInvalidMethod = 5004,
    /// Webhook signature verification failed
    WebhookSignatureInvalid = 5005,

    // ==================== 6xxx: Catalog ====================
    /// Service not found in the shop catalog
    ServiceNotFound = 6001,
    /// Service is deactivated
    ServiceInactive = 6002,

    // ==================== 8xxx: Staff / Customer ====================
    /// Staff member not found
    StaffNotFound = 8001,
    /// Staff member is deactivated
    StaffInactive = 8002,
    /// Customer not found
    CustomerNotFound = 8101,
    /// Customer name required for implicit creation
    CustomerNameRequired = 8102,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Timeout error
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::StaffScopeViolation => "Barbers may only manage their own appointments",

            // Tenant
            ErrorCode::TenantNotSelected => "No shop selected",
            ErrorCode::TenantNotFound => "Shop not found",
            ErrorCode::TenantInactive => "Shop is not active",

            // Appointment
            ErrorCode::AppointmentNotFound => "Appointment not found",
            ErrorCode::AppointmentConflict => {
                "This time slot is already booked for the selected barber"
            }
            ErrorCode::InvalidTimeRange => "End time must be after start time",
            ErrorCode::InvalidStatusTransition => "Status change is not allowed",
            ErrorCode::AppointmentAlreadyCompleted => "Appointment is already completed",
            ErrorCode::EmptyServiceSet => "At least one service is required",
            ErrorCode::InvalidDuration => "Duration must be a positive number of minutes",

            // Payment
            ErrorCode::PaymentFailed => "Payment failed",
            ErrorCode::PaymentNotFound => "Payment record not found",
            ErrorCode::InvalidAmount => "Invalid amount",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature is invalid",

            // Catalog
            ErrorCode::ServiceNotFound => "Service not found",
            ErrorCode::ServiceInactive => "Service is not active",

            // Staff / Customer
            ErrorCode::StaffNotFound => "Staff member not found",
            ErrorCode::StaffInactive => "Staff member is not active",
            ErrorCode::CustomerNotFound => "Customer not found",
            ErrorCode::CustomerNameRequired => "Customer name is required",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::StaffScopeViolation),

            // Tenant
            3001 => Ok(ErrorCode::TenantNotSelected),
            3002 => Ok(ErrorCode::TenantNotFound),
            3003 => Ok(ErrorCode::TenantInactive),

            // Appointment
            4001 => Ok(ErrorCode::AppointmentNotFound),
            4002 => Ok(ErrorCode::AppointmentConflict),
            4003 => Ok(ErrorCode::InvalidTimeRange),
            4004 => Ok(ErrorCode::InvalidStatusTransition),
            4005 => Ok(ErrorCode::AppointmentAlreadyCompleted),
            4006 => Ok(ErrorCode::EmptyServiceSet),
            4007 => Ok(ErrorCode::InvalidDuration),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentNotFound),
            5003 => Ok(ErrorCode::InvalidAmount),
            5004 => Ok(ErrorCode::PaymentInvalidMethod),
            5005 => Ok(ErrorCode::WebhookSignatureInvalid),

            // Catalog
            6001 => Ok(ErrorCode::ServiceNotFound),
            6002 => Ok(ErrorCode::ServiceInactive),

            // Staff / Customer
            8001 => Ok(ErrorCode::StaffNotFound),
            8002 => Ok(ErrorCode::StaffInactive),
            8101 => Ok(ErrorCode::CustomerNotFound),
            8102 => Ok(ErrorCode::CustomerNameRequired),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::AppointmentConflict.code(), 4002);
        assert_eq!(ErrorCode::StaffNotFound.code(), 8001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_u16() {
        assert_eq!(ErrorCode::try_from(4001), Ok(ErrorCode::AppointmentNotFound));
        assert_eq!(ErrorCode::try_from(8102), Ok(ErrorCode::CustomerNameRequired));
        assert_eq!(ErrorCode::try_from(4321), Err(InvalidErrorCode(4321)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::AppointmentConflict).unwrap();
        assert_eq!(json, "4002");

        let code: ErrorCode = serde_json::from_str("6001").unwrap();
        assert_eq!(code, ErrorCode::ServiceNotFound);

        assert!(serde_json::from_str::<ErrorCode>("7777").is_err());
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::AppointmentNotFound.is_success());
    }
}
