use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::AppointmentError;

/// Slots are minute-granular: seconds and finer are dropped before any
/// comparison or persistence.
pub fn truncate_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

pub struct ConflictCheckService {
    supabase: Arc<SupabaseClient>,
}

impl ConflictCheckService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// True when the professional already has a non-cancelled appointment
    /// at the candidate minute. Cancelled rows never block, so a
    /// cancel-then-rebook of the same slot succeeds.
    ///
    /// This read runs before the insert without a lock; the partial unique
    /// index on (professional_id, scheduled_at) for non-cancelled rows is
    /// what actually decides a concurrent race (surfaced as a 409 on
    /// insert).
    pub async fn is_slot_taken(
        &self,
        professional_id: Uuid,
        scheduled_at: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let slot = truncate_to_minute(scheduled_at);
        debug!("Checking slot {} for professional {}", slot, professional_id);

        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&scheduled_at=eq.{}&status=neq.cancelled&limit=1",
            professional_id,
            urlencoding::encode(&slot.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let taken = !rows.is_empty();
        if taken {
            warn!(
                "Slot {} for professional {} is already occupied",
                slot, professional_id
            );
        }

        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn truncation_drops_seconds_and_nanoseconds() {
        let ts = Utc
            .with_ymd_and_hms(2025, 6, 2, 14, 0, 37)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();

        let slot = truncate_to_minute(ts);

        assert_eq!(slot, Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap());
    }

    #[test]
    fn truncation_is_idempotent() {
        let slot = Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap();
        assert_eq!(truncate_to_minute(slot), slot);
    }
}
