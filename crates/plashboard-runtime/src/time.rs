//! Scheduling-time helpers.

use chrono::{DateTime, Utc};
use plashboard_store::RunState;

/// The max of `last_attempt_at` and `last_success_at`, considering only
/// timestamps that parse, or `None` if neither does.
#[must_use]
pub fn last_attempt_at_ms(run_state: Option<&RunState>) -> Option<i64> {
    let run_state = run_state?;
    let attempt = run_state.last_attempt_at.as_deref().and_then(parse_ms);
    let success = run_state.last_success_at.as_deref().and_then(parse_ms);
    match (attempt, success) {
        (Some(a), Some(s)) => Some(a.max(s)),
        (Some(a), None) => Some(a),
        (None, Some(s)) => Some(s),
        (None, None) => None,
    }
}

fn parse_ms(raw: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
}

/// Is a template due to run, given its last-attempt timestamp and schedule
///: due when there has been no successful-or-attempted run, or
/// when `every_minutes` have elapsed since the most recent of the two.
#[must_use]
pub fn is_due(last_attempt_at_ms: Option<i64>, every_minutes: u32, now: DateTime<Utc>) -> bool {
    match last_attempt_at_ms {
        None => true,
        Some(last) => {
            let interval_ms = i64::from(every_minutes) * 60_000;
            now.timestamp_millis() >= last + interval_ms
        }
    }
}
