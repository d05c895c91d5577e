//! Time related utils.

use crate::Error;
use chrono::Utc;

/// DateTime is the alias of `chrono::DateTime<Utc>`.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into http date: `Sun, 06 Nov 1994 08:49:37 GMT`
///
/// ## Note
///
/// HTTP date is slightly different from RFC2822.
///
/// - Timezone is fixed to GMT.
/// - Day must be 2 digit.
pub fn format_http_date(t: DateTime) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse time from RFC2822, for example: `Mon, 15 Aug 2022 16:50:12 GMT`.
pub fn parse_rfc2822(s: &str) -> crate::Result<DateTime> {
    let t = chrono::DateTime::parse_from_rfc2822(s)
        .map_err(|e| Error::unexpected(format!("parse '{s}' as rfc2822 failed")).with_source(e))?
        .with_timezone(&Utc);

    Ok(t)
}

/// Unix timestamp in seconds, rounded to the nearest second.
pub fn unix_seconds_rounded(t: DateTime) -> i64 {
    (t.timestamp_millis() + 500).div_euclid(1000)
}
