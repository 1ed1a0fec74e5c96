use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AppointmentError, ScheduleAppointmentRequest};
use crate::services::booking::AppointmentBookingService;

fn to_app_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::Validation(errors) => AppError::Validation(errors),
        AppointmentError::ProfessionalNotFound => AppError::NotFound(
            "Professional not found. Check the name and try again.".to_string(),
        ),
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::SlotTaken => {
            AppError::BadRequest("Time slot is already taken".to_string())
        }
        AppointmentError::AlreadyCancelled => {
            AppError::BadRequest("Appointment is already cancelled".to_string())
        }
        AppointmentError::InvalidStatusTransition(status) => AppError::BadRequest(format!(
            "Appointment cannot change status from {}",
            status,
        )),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

/// The middleware guarantees a user; booking and cancelling additionally
/// require the patient role, since professionals do not own appointments.
fn require_patient(user: &User) -> Result<Uuid, AppError> {
    if !user.is_patient() {
        return Err(AppError::Auth(
            "Only patients can perform this action".to_string(),
        ));
    }

    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid subject in token".to_string()))
}

#[axum::debug_handler]
pub async fn schedule_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<ScheduleAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient_id = require_patient(&user)?;

    let service = AppointmentBookingService::new(&config);

    let appointment = service
        .schedule(request, patient_id, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Appointment scheduled successfully",
            "notes": appointment.notes,
            "status": appointment.status,
        })),
    ))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient_id = require_patient(&user)?;

    let service = AppointmentBookingService::new(&config);

    let appointment = service
        .cancel(appointment_id, patient_id, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "message": "Appointment cancelled successfully",
        "appointment": appointment,
    })))
}

/// Role-dependent listing: patients see their history (most recent first),
/// professionals their agenda (soonest first).
#[axum::debug_handler]
pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&config);

    if user.is_patient() {
        let patient_id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Auth("Invalid subject in token".to_string()))?;

        let appointments = service
            .list_for_patient(patient_id, auth.token())
            .await
            .map_err(to_app_error)?;

        return Ok(Json(json!({
            "appointments": appointments,
            "total": appointments.len(),
        })));
    }

    if user.is_professional() {
        let professional_id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Auth("Invalid subject in token".to_string()))?;

        let appointments = service
            .agenda_for_professional(professional_id, auth.token())
            .await
            .map_err(to_app_error)?;

        return Ok(Json(json!({
            "appointments": appointments,
            "total": appointments.len(),
        })));
    }

    Err(AppError::Auth("Unrecognized role in token".to_string()))
}
