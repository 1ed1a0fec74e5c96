use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::DbError;
use shared_models::FieldErrors;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub cpf: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub specialty: String,
    pub license_number: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Professional {
    pub fn profile(&self) -> ProfessionalProfile {
        ProfessionalProfile {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            cpf: self.cpf.clone(),
            specialty: self.specialty.clone(),
            license_number: self.license_number.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
        }
    }
}

/// What the API exposes about a professional; the credential hash never
/// leaves the service layer.
#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub cpf: String,
    pub specialty: String,
    pub license_number: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterProfessionalRequest {
    pub full_name: String,
    pub email: String,
    pub cpf: String,
    pub password: String,
    pub specialty: String,
    pub license_number: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfessionalError {
    #[error("Professional not found")]
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

impl From<DbError> for ProfessionalError {
    fn from(err: DbError) -> Self {
        match err {
            // Unique-index violation on email/cpf that slipped past the
            // pre-check.
            DbError::Conflict(_) => ProfessionalError::Duplicate,
            other => ProfessionalError::Database(other.to_string()),
        }
    }
}
