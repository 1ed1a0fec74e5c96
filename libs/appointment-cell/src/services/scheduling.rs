use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use tracing::debug;

use shared_models::FieldErrors;

/// Business constraints applied before an appointment is persisted.
#[derive(Debug, Clone)]
pub struct SchedulingRules {
    pub min_lead: Duration,
    pub opening: NaiveTime,
    pub closing: NaiveTime,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            min_lead: Duration::hours(24),
            opening: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            closing: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        }
    }
}

/// Validates a candidate date and time-of-day against the scheduling rules.
///
/// Every check runs and all violations are reported together, keyed by
/// field; the only exception is a format error, which suppresses the
/// semantic checks for that same field. No side effects — the caller is
/// responsible for persistence and conflict detection.
pub struct SchedulingValidator {
    rules: SchedulingRules,
}

impl SchedulingValidator {
    pub fn new() -> Self {
        Self { rules: SchedulingRules::default() }
    }

    pub fn with_rules(rules: SchedulingRules) -> Self {
        Self { rules }
    }

    /// `now` is explicit so the lead-time rule is deterministic under test.
    /// On success returns the combined UTC instant at minute resolution.
    pub fn validate(
        &self,
        date: &str,
        time: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, FieldErrors> {
        let mut errors = FieldErrors::new();

        let parsed_date = match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                errors.add("date", "The date must be a valid date in YYYY-MM-DD format");
                None
            }
        };

        let parsed_time = match NaiveTime::parse_from_str(time, "%H:%M") {
            Ok(t) => Some(t),
            Err(_) => {
                errors.add("time", "The time must be in 24-hour HH:MM format");
                None
            }
        };

        if let Some(d) = parsed_date {
            if d <= now.date_naive() {
                errors.add("date", "The date must be a future date");
            }

            if matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
                errors.add("date", "Appointments are only available on weekdays");
            }
        }

        if let Some(t) = parsed_time {
            if t < self.rules.opening || t >= self.rules.closing {
                errors.add(
                    "time",
                    format!(
                        "Appointments are only available between {} and {}",
                        self.rules.opening.format("%H:%M"),
                        self.rules.closing.format("%H:%M"),
                    ),
                );
            }
        }

        // Lead time needs both fields; a format error on either already
        // fails the request, so skipping it loses nothing.
        let scheduled_at = match (parsed_date, parsed_time) {
            (Some(d), Some(t)) => {
                let at = Utc.from_utc_datetime(&d.and_time(t));
                if at - now < self.rules.min_lead {
                    errors.add(
                        "date",
                        format!(
                            "Appointments must be booked at least {} hours in advance",
                            self.rules.min_lead.num_hours(),
                        ),
                    );
                }
                Some(at)
            }
            _ => None,
        };

        match (scheduled_at, errors.is_empty()) {
            (Some(at), true) => {
                debug!("Scheduling request for {} passed validation", at);
                Ok(at)
            }
            _ => Err(errors),
        }
    }
}

impl Default for SchedulingValidator {
    fn default() -> Self {
        Self::new()
    }
}
