//! # Error Types
//!
//! Domain-specific error types for salon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  salon-core errors (this file)                                          │
//! │  ├── CoreError        - Booking / lifecycle rule violations             │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  salon-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  salon-engine errors                                                    │
//! │  └── EngineError      - What callers see ({code, message})              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → EngineError → caller     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Booking and lifecycle rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The (staff, date, time) slot is held by another active appointment.
    ///
    /// ## User Workflow
    /// ```text
    /// Book Ali @ 2024-05-01 10:00
    ///      │
    ///      ▼
    /// Active appointment APP-20240501-003 already there
    ///      │
    ///      ▼
    /// SlotTaken { staff_id, date: "2024-05-01", time: "10:00" }
    ///      │
    ///      ▼
    /// UI shows: "That time is already booked"
    /// ```
    #[error("Slot {date} {time} is already booked for staff {staff_id}")]
    SlotTaken {
        staff_id: String,
        date: String,
        time: String,
    },

    /// An entity looked up by id or number does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The requested status change is not an edge of the lifecycle.
    #[error("Appointment {number} cannot move from {from} to {to}")]
    InvalidTransition {
        number: String,
        from: String,
        to: String,
    },

    /// The appointment reached a terminal state and can no longer change.
    ///
    /// ## When This Occurs
    /// - Completing an appointment twice
    /// - Editing a cancelled or no-show appointment
    #[error("Appointment {number} is already {status}")]
    AlreadyFinal { number: String, status: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for the common not-found case.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Nothing is written when one is raised.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., bad phone, off-grid time).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Referenced staff member or service cannot take new work.
    #[error("{entity} '{name}' is not active")]
    Inactive { entity: &'static str, name: String },

    /// Customer tried to redeem more points than they hold.
    #[error("Cannot redeem {requested} points, balance is {available}")]
    InsufficientPoints { requested: i64, available: i64 },

    /// Duplicate value (e.g., second customer with the same phone).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::SlotTaken {
            staff_id: "st-1".to_string(),
            date: "2024-05-01".to_string(),
            time: "10:00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Slot 2024-05-01 10:00 is already booked for staff st-1"
        );

        let err = CoreError::not_found("Service", "svc-9");
        assert_eq!(err.to_string(), "Service not found: svc-9");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::TooShort {
            field: "phone".to_string(),
            min: 8,
        };
        assert_eq!(err.to_string(), "phone must be at least 8 characters");

        let err = ValidationError::InsufficientPoints {
            requested: 40,
            available: 12,
        };
        assert_eq!(err.to_string(), "Cannot redeem 40 points, balance is 12");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
