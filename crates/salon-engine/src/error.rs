//! # Engine Error Type
//!
//! The single error type returned by every engine operation.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError (salon-core) ──────────────► Validation                │
//! │  CoreError       (salon-core) ── SlotTaken ─► Conflict                  │
//! │                               ── NotFound ──► NotFound                  │
//! │                               ── lifecycle ─► InvalidState              │
//! │  DbError         (salon-db)   ── slot index ► Conflict                  │
//! │                               ── NotFound ──► NotFound                  │
//! │                               ── other ─────► Persistence (logged)      │
//! │                                                                         │
//! │  Caller receives: { "code": "CONFLICT", "message": "..." }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::config::ConfigError;
use salon_core::{CoreError, ValidationError};
use salon_db::DbError;

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or missing input.
    ValidationError,
    /// Slot already booked, or a contended resource.
    Conflict,
    NotFound,
    /// Operation not allowed in the appointment's current status.
    InvalidState,
    /// Storage failure; nothing was applied.
    PersistenceError,
    ConfigError,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Conflict(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{0}")]
    InvalidState(String),

    /// Details are logged; the message stays generic.
    #[error("{0}")]
    Persistence(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation(_) => ErrorCode::ValidationError,
            EngineError::Conflict(_) => ErrorCode::Conflict,
            EngineError::NotFound { .. } => ErrorCode::NotFound,
            EngineError::InvalidState(_) => ErrorCode::InvalidState,
            EngineError::Persistence(_) => ErrorCode::PersistenceError,
            EngineError::Config(_) => ErrorCode::ConfigError,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Serialized as `{ "code": "...", "message": "..." }`.
impl Serialize for EngineError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("EngineError", 2)?;
        s.serialize_field("code", &self.code())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SlotTaken { .. } => EngineError::Conflict(err.to_string()),
            CoreError::NotFound { entity, id } => EngineError::not_found(entity, id),
            CoreError::InvalidTransition { .. } | CoreError::AlreadyFinal { .. } => {
                EngineError::InvalidState(err.to_string())
            }
            CoreError::Validation(e) => EngineError::Validation(e),
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        if err.is_slot_conflict() {
            tracing::warn!(error = %err, "Slot index rejected write");
            return EngineError::Conflict("That time slot is already booked".to_string());
        }
        if err.is_number_collision() {
            tracing::warn!(error = %err, "Business number collision");
            return EngineError::Conflict("Could not reserve a business number".to_string());
        }
        if err.is_unique_on("appointment_id") {
            return EngineError::InvalidState("Appointment already has a session".to_string());
        }
        if err.is_unique_on("phone") {
            return EngineError::Validation(ValidationError::Duplicate {
                field: "phone".to_string(),
                value: "given phone".to_string(),
            });
        }

        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::CheckViolation { message } => {
                tracing::warn!(%message, "Check constraint rejected write");
                EngineError::Validation(ValidationError::InvalidFormat {
                    field: "record".to_string(),
                    reason: "value out of allowed range".to_string(),
                })
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                EngineError::Persistence("Database is busy, try again".to_string())
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                EngineError::Persistence("Database operation failed".to_string())
            }
        }
    }
}

/// Commit and rollback failures surface through `DbError`'s classification.
impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::from(DbError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_code_and_message() {
        let err = EngineError::Conflict("That time slot is already booked".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "CONFLICT");
        assert_eq!(json["message"], "That time slot is already booked");

        let err = EngineError::not_found("Staff", "abc");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Staff not found: abc");
    }

    #[test]
    fn test_db_unique_violations_are_classified() {
        let slot = DbError::duplicate(
            "appointments.staff_id, appointments.appointment_date, appointments.appointment_time",
            "unknown",
        );
        assert_eq!(EngineError::from(slot).code(), ErrorCode::Conflict);

        let phone = DbError::duplicate("customers.phone", "unknown");
        assert_eq!(EngineError::from(phone).code(), ErrorCode::ValidationError);

        let twice = DbError::duplicate("sessions.appointment_id", "unknown");
        assert_eq!(EngineError::from(twice).code(), ErrorCode::InvalidState);
    }

    #[test]
    fn test_storage_failures_are_generic() {
        let err = EngineError::from(DbError::QueryFailed("disk I/O error".to_string()));
        assert_eq!(err.code(), ErrorCode::PersistenceError);
        assert!(!err.to_string().contains("disk"));
    }

    #[test]
    fn test_core_errors_map() {
        let err = EngineError::from(CoreError::AlreadyFinal {
            number: "APP-20240501-001".to_string(),
            status: "completed".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::InvalidState);

        let err = EngineError::from(CoreError::not_found("Service", "x"));
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
