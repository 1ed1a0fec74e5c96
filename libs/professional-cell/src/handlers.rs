use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{LoginRequest, ProfessionalError, RegisterProfessionalRequest};
use crate::services::ProfessionalService;

fn to_app_error(err: ProfessionalError) -> AppError {
    match err {
        ProfessionalError::Validation(errors) => AppError::Validation(errors),
        ProfessionalError::InvalidCredentials => {
            AppError::Auth("Invalid credentials".to_string())
        }
        ProfessionalError::NotFound => {
            AppError::NotFound("Professional not found".to_string())
        }
        ProfessionalError::Duplicate => {
            AppError::BadRequest("Email or CPF is already registered".to_string())
        }
        ProfessionalError::Token(msg) => AppError::Internal(msg),
        ProfessionalError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn register_professional(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterProfessionalRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ProfessionalService::new(&config);

    let (professional, token) = service.register(request).await.map_err(to_app_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Professional registered successfully",
            "token": token,
            "professional": professional.profile(),
        })),
    ))
}

#[axum::debug_handler]
pub async fn login_professional(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&config);

    let (professional, token) = service.login(request).await.map_err(to_app_error)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "professional": professional.profile(),
    })))
}

#[axum::debug_handler]
pub async fn list_professionals(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&config);

    let professionals = service.list().await.map_err(to_app_error)?;
    let profiles: Vec<_> = professionals.iter().map(|p| p.profile()).collect();

    Ok(Json(json!({
        "professionals": profiles,
        "total": profiles.len(),
    })))
}
