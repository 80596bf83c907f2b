//! # Issuance Timestamps
//!
//! Issued documents carry an ISO 8601 timestamp in UTC with an explicit
//! `+00:00` offset and microsecond precision.

use chrono::{DateTime, SecondsFormat, Utc};

/// The current time as an issuance timestamp.
pub fn issuance_timestamp() -> String {
    format_issuance(Utc::now())
}

/// Format a UTC instant as an issuance timestamp.
pub fn format_issuance(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_offset_and_micros() {
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(format_issuance(at), "2026-01-15T12:00:00.000000+00:00");
    }

    #[test]
    fn now_parses_back() {
        let stamp = issuance_timestamp();
        assert!(DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
