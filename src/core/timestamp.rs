//! Purpose: Recognize RFC 3339 date-times inside string payloads.
//! Exports: `parse_rfc3339_epoch`.
//! Role: Subordinate to string decoding; a match rewrites the value to epoch seconds.
//! Invariants: A non-match is an expected sentinel (`None`), never an error.
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Parse `raw` as an RFC 3339 date-time and return Unix epoch seconds (UTC).
///
/// Offsets are honored: `2014-07-16T22:55:46+02:00` and `2014-07-16T20:55:46Z`
/// map to the same instant.
pub fn parse_rfc3339_epoch(raw: &str) -> Option<i64> {
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(parsed) => Some(parsed.unix_timestamp()),
        Err(_) => {
            tracing::trace!(value = raw, "not an RFC 3339 date-time");
            None
        }
    }
}
