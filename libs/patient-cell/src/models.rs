use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::DbError;
use shared_models::FieldErrors;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub cpf: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: String,
    pub address: String,
    pub birth_date: NaiveDate,
    pub sex: String,
    pub marital_status: String,
    pub occupation: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn profile(&self) -> PatientProfile {
        PatientProfile {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            cpf: self.cpf.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            birth_date: self.birth_date,
            sex: self.sex.clone(),
            marital_status: self.marital_status.clone(),
            occupation: self.occupation.clone(),
        }
    }
}

/// Public projection of a patient record; never carries the credential
/// hash.
#[derive(Debug, Clone, Serialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    pub address: String,
    pub birth_date: NaiveDate,
    pub sex: String,
    pub marital_status: String,
    pub occupation: String,
}

/// Registration input. `birth_date` is a string so a malformed date lands
/// in the field-error map instead of failing body deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPatientRequest {
    pub full_name: String,
    pub email: String,
    pub cpf: String,
    pub password: String,
    pub phone: String,
    pub address: String,
    pub birth_date: String,
    pub sex: String,
    pub marital_status: String,
    pub occupation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email or CPF is already registered")]
    Duplicate,

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbError> for PatientError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(_) => PatientError::Duplicate,
            other => PatientError::Database(other.to_string()),
        }
    }
}
