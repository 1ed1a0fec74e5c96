use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use professional_cell::services::ProfessionalService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    AgendaEntryView, Appointment, AppointmentError, AppointmentStatus,
    PatientAppointmentView, ScheduleAppointmentRequest,
};
use crate::services::conflict::ConflictCheckService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::scheduling::SchedulingValidator;

/// Row shape for the explicit name-resolution queries; views are built from
/// two repository reads, never an implicit join.
#[derive(Debug, Deserialize)]
struct NameRow {
    id: Uuid,
    full_name: String,
}

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    validator: SchedulingValidator,
    conflict_service: ConflictCheckService,
    lifecycle_service: AppointmentLifecycleService,
    professional_service: ProfessionalService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            validator: SchedulingValidator::new(),
            conflict_service: ConflictCheckService::new(Arc::clone(&supabase)),
            lifecycle_service: AppointmentLifecycleService::new(),
            professional_service: ProfessionalService::new(config),
            supabase,
        }
    }

    /// Validate → resolve professional → conflict check → insert. The
    /// pre-check and the insert are not atomic; the slot unique index turns
    /// a lost race into the same `SlotTaken` outcome.
    pub async fn schedule(
        &self,
        request: ScheduleAppointmentRequest,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Scheduling appointment for patient {}", patient_id);

        let scheduled_at = self
            .validator
            .validate(&request.date, &request.time, Utc::now())
            .map_err(AppointmentError::Validation)?;

        let professional = self
            .professional_service
            .find_by_name(&request.professional_name, auth_token)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?
            .ok_or(AppointmentError::ProfessionalNotFound)?;

        if self
            .conflict_service
            .is_slot_taken(professional.id, scheduled_at, auth_token)
            .await?
        {
            return Err(AppointmentError::SlotTaken);
        }

        let now = Utc::now().to_rfc3339();
        let appointment_data = json!({
            "patient_id": patient_id,
            "professional_id": professional.id,
            "scheduled_at": scheduled_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "notes": request.notes,
            "status": AppointmentStatus::Scheduled,
            "created_at": now,
            "updated_at": now,
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await?;

        let appointment = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database("insert returned no row".to_string()))?;

        info!(
            "Appointment {} scheduled for patient {} with professional {} at {}",
            appointment.id, patient_id, professional.id, appointment.scheduled_at,
        );

        Ok(appointment)
    }

    /// Cancel one of the caller's own appointments. The query filters on
    /// both id and patient, so someone else's appointment reads as missing
    /// rather than forbidden.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&patient_id=eq.{}",
            appointment_id, patient_id,
        );

        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let appointment = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;

        self.lifecycle_service
            .validate_status_transition(&appointment.status, &AppointmentStatus::Cancelled)?;

        let now = Utc::now();
        let notes = self
            .lifecycle_service
            .cancellation_note(appointment.notes.as_deref(), now);

        let update = json!({
            "status": AppointmentStatus::Cancelled,
            "notes": notes,
            "updated_at": now.to_rfc3339(),
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(update), Some(headers))
            .await?;

        let updated = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;

        info!(
            "Appointment {} cancelled by patient {}",
            updated.id, patient_id,
        );

        Ok(updated)
    }

    /// The caller's history, most recent first.
    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<PatientAppointmentView>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=scheduled_at.desc",
            patient_id,
        );

        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let professional_ids: BTreeSet<Uuid> =
            appointments.iter().map(|a| a.professional_id).collect();
        let names = self
            .resolve_names("professionals", &professional_ids, auth_token)
            .await?;

        Ok(appointments
            .into_iter()
            .map(|a| {
                let professional = names.get(&a.professional_id).cloned().unwrap_or_else(|| {
                    warn!("Professional {} missing for appointment {}", a.professional_id, a.id);
                    String::new()
                });
                PatientAppointmentView {
                    id: a.id,
                    date: a.scheduled_at.format("%d/%m/%Y").to_string(),
                    time: a.scheduled_at.format("%H:%M").to_string(),
                    professional,
                    notes: a.notes,
                    status: a.status,
                }
            })
            .collect())
    }

    /// The professional's agenda, soonest first.
    pub async fn agenda_for_professional(
        &self,
        professional_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AgendaEntryView>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&order=scheduled_at.asc",
            professional_id,
        );

        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let patient_ids: BTreeSet<Uuid> = appointments.iter().map(|a| a.patient_id).collect();
        let names = self.resolve_names("patients", &patient_ids, auth_token).await?;

        Ok(appointments
            .into_iter()
            .map(|a| {
                let patient = names.get(&a.patient_id).cloned().unwrap_or_else(|| {
                    warn!("Patient {} missing for appointment {}", a.patient_id, a.id);
                    String::new()
                });
                AgendaEntryView {
                    id: a.id,
                    date: a.scheduled_at.format("%d/%m/%Y").to_string(),
                    time: a.scheduled_at.format("%H:%M").to_string(),
                    patient,
                    notes: a.notes,
                    status: a.status,
                }
            })
            .collect())
    }

    async fn resolve_names(
        &self,
        table: &str,
        ids: &BTreeSet<Uuid>,
        auth_token: &str,
    ) -> Result<HashMap<Uuid, String>, AppointmentError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let id_list = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/{}?id=in.({})&select=id,full_name",
            table, id_list,
        );

        let rows: Vec<NameRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(rows.into_iter().map(|r| (r.id, r.full_name)).collect())
    }
}
