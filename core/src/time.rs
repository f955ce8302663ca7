//! Time related utils.
//!
//! Everything here works in UTC regardless of the local timezone.

use crate::Error;
use crate::Result;
use chrono::NaiveDateTime;
use chrono::TimeDelta;
use chrono::Utc;

/// DateTime used by signers, always in UTC.
pub type DateTime = chrono::DateTime<Utc>;

/// Date format: "20220313"
const DATE: &str = "%Y%m%d";

/// Time format for ISO 8601 basic: "20220313T072004Z"
const ISO8601: &str = "%Y%m%dT%H%M%SZ";

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into date: `20220301`
pub fn format_date(t: DateTime) -> String {
    t.format(DATE).to_string()
}

/// Format time into ISO 8601 basic format: `20220313T072004Z`
pub fn format_iso8601(t: DateTime) -> String {
    t.format(ISO8601).to_string()
}

/// Parse time from ISO 8601 basic format: `20220313T072004Z`
pub fn parse_iso8601(s: &str) -> Result<DateTime> {
    let t = NaiveDateTime::parse_from_str(s, ISO8601).map_err(|e| {
        Error::unexpected(format!("failed to parse {s} as iso8601 time")).with_source(e)
    })?;
    Ok(t.and_utc())
}

/// Parse time from rfc3339: `2022-03-13T07:20:04Z`
pub fn parse_rfc3339(s: &str) -> Result<DateTime> {
    let t = chrono::DateTime::parse_from_rfc3339(s).map_err(|e| {
        Error::unexpected(format!("failed to parse {s} as rfc3339 time")).with_source(e)
    })?;
    Ok(t.with_timezone(&Utc))
}

/// Shift a time back by a clock skew given in seconds.
///
/// A positive skew means the local clock runs ahead of the server's. A skew
/// that moves the time out of the representable range is `RequestInvalid`.
pub fn apply_skew(t: DateTime, skew_secs: i64) -> Result<DateTime> {
    TimeDelta::try_seconds(skew_secs)
        .and_then(|skew| t.checked_sub_signed(skew))
        .ok_or_else(|| {
            Error::request_invalid(format!("clock skew of {skew_secs} seconds is out of range"))
        })
}
