use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{LoginRequest, PatientError, RegisterPatientRequest};
use crate::services::PatientService;

fn to_app_error(err: PatientError) -> AppError {
    match err {
        PatientError::Validation(errors) => AppError::Validation(errors),
        PatientError::InvalidCredentials => AppError::Auth("Invalid credentials".to_string()),
        PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
        PatientError::Duplicate => {
            AppError::BadRequest("Email or CPF is already registered".to_string())
        }
        PatientError::Token(msg) => AppError::Internal(msg),
        PatientError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn register_patient(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = PatientService::new(&config);

    let (patient, token) = service.register(request).await.map_err(to_app_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Patient registered successfully",
            "token": token,
            "patient": patient.profile(),
        })),
    ))
}

#[axum::debug_handler]
pub async fn login_patient(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    let (patient, token) = service.login(request).await.map_err(to_app_error)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "patient": patient.profile(),
    })))
}
