use chrono::{DateTime, SecondsFormat, Utc};

/// Current time as an RFC 3339 UTC timestamp with millisecond precision,
/// e.g. `2026-10-19T08:30:00.123Z`.
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses any RFC 3339 timestamp and re-renders it in the canonical form.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| format_timestamp(at.with_timezone(&Utc)))
}
