use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Owns the status transition table. `scheduled` is the initial state;
/// `cancelled` and `completed` are terminal. No endpoint drives the
/// `completed` transition, but the table still admits it.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current: &AppointmentStatus,
        new: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current, new);

        if *current == AppointmentStatus::Cancelled && *new == AppointmentStatus::Cancelled {
            return Err(AppointmentError::AlreadyCancelled);
        }

        if !self.valid_transitions(current).contains(new) {
            warn!("Invalid status transition attempted: {} -> {}", current, new);
            return Err(AppointmentError::InvalidStatusTransition(current.clone()));
        }

        Ok(())
    }

    pub fn valid_transitions(&self, current: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ],
            // Terminal states
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::Completed => vec![],
        }
    }

    /// Cancellation keeps its audit trail in the free-text notes field.
    pub fn cancellation_note(&self, notes: Option<&str>, at: DateTime<Utc>) -> String {
        let stamp = format!(
            "Cancelled by patient at {}",
            at.to_rfc3339_opts(SecondsFormat::Secs, true),
        );

        match notes {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, stamp),
            _ => stamp,
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    #[test]
    fn scheduled_can_cancel_or_complete() {
        let service = AppointmentLifecycleService::new();

        assert!(service
            .validate_status_transition(&AppointmentStatus::Scheduled, &AppointmentStatus::Cancelled)
            .is_ok());
        assert!(service
            .validate_status_transition(&AppointmentStatus::Scheduled, &AppointmentStatus::Completed)
            .is_ok());
    }

    #[test]
    fn cancelling_twice_is_rejected_not_ignored() {
        let service = AppointmentLifecycleService::new();

        let result = service
            .validate_status_transition(&AppointmentStatus::Cancelled, &AppointmentStatus::Cancelled);

        assert_matches!(result, Err(AppointmentError::AlreadyCancelled));
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        let service = AppointmentLifecycleService::new();

        assert!(service.valid_transitions(&AppointmentStatus::Cancelled).is_empty());
        assert!(service.valid_transitions(&AppointmentStatus::Completed).is_empty());

        let result = service
            .validate_status_transition(&AppointmentStatus::Completed, &AppointmentStatus::Scheduled);
        assert_matches!(result, Err(AppointmentError::InvalidStatusTransition(_)));
    }

    #[test]
    fn cancellation_note_appends_to_existing_notes() {
        let service = AppointmentLifecycleService::new();
        let at = Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap();

        let appended = service.cancellation_note(Some("Routine check"), at);
        assert_eq!(
            appended,
            "Routine check\nCancelled by patient at 2025-06-02T14:00:00Z"
        );

        let fresh = service.cancellation_note(None, at);
        assert_eq!(fresh, "Cancelled by patient at 2025-06-02T14:00:00Z");
    }
}
