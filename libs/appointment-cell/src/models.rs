use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::DbError;
use shared_models::FieldErrors;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Cancelled appointments never occupy a slot; scheduled and completed
    /// ones do.
    pub fn blocks_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Booking input. `date` and `time` stay as strings so the validator can
/// report format problems as field errors instead of a deserialization
/// failure, and so a format error suppresses that field's semantic checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleAppointmentRequest {
    pub professional_name: String,
    pub date: String,
    pub time: String,
    pub notes: Option<String>,
}

/// A patient's appointment history entry.
#[derive(Debug, Clone, Serialize)]
pub struct PatientAppointmentView {
    pub id: Uuid,
    pub date: String,
    pub time: String,
    pub professional: String,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
}

/// A professional's agenda entry.
#[derive(Debug, Clone, Serialize)]
pub struct AgendaEntryView {
    pub id: Uuid,
    pub date: String,
    pub time: String,
    pub patient: String,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Time slot is already taken")]
    SlotTaken,

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Appointment cannot change status from {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbError> for AppointmentError {
    fn from(err: DbError) -> Self {
        match err {
            // A racing insert that trips the slot unique index surfaces as
            // 409 and means the same thing as a failed pre-check.
            DbError::Conflict(_) => AppointmentError::SlotTaken,
            other => AppointmentError::Database(other.to_string()),
        }
    }
}
