//! Purpose: Decode scalar payload strings (`S`, `N`, `BOOL`, `NULL` tags).
//! Exports: `parse_string`, `parse_number`, `parse_boolean`, `parse_null_flag`.
//! Role: Leaf converters shared by the map and list decoders via one dispatch table.
//! Invariants: Every payload is trimmed before validation.
//! Invariants: An RFC 3339 string decodes to epoch seconds, never to a string.
use serde_json::{Number, Value};

use crate::core::error::{Error, ErrorKind};
use crate::core::timestamp::parse_rfc3339_epoch;

// Optional sign, optional integer-part-plus-dot, at least one digit.
fn number_regex() -> &'static regex::Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[+-]?([0-9]*\.)?[0-9]+$").unwrap())
}

/// Decode an `S` payload. Timestamps override the string type: any trimmed
/// payload that parses as RFC 3339 becomes its Unix epoch seconds.
pub fn parse_string(raw: &str) -> Result<Value, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::new(ErrorKind::EmptyString)
            .with_message("string payload is empty after trimming")
            .with_token(raw));
    }
    if let Some(epoch) = parse_rfc3339_epoch(trimmed) {
        return Ok(Value::from(epoch));
    }
    Ok(Value::String(trimmed.to_string()))
}

/// Decode an `N` payload: signed 64-bit integer first, `f64` fallback.
pub fn parse_number(raw: &str) -> Result<Value, Error> {
    let trimmed = raw.trim();
    if !number_regex().is_match(trimmed) {
        return Err(Error::new(ErrorKind::InvalidNumber)
            .with_message("number payload does not match the numeric grammar")
            .with_token(raw));
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Ok(Value::from(int));
    }
    let float = trimmed.parse::<f64>().map_err(|err| {
        Error::new(ErrorKind::InvalidNumber)
            .with_message("number payload is not representable as f64")
            .with_token(raw)
            .with_source(err)
    })?;
    // Digit strings long enough to overflow f64 round to infinity, which JSON
    // cannot carry.
    let number = Number::from_f64(float).ok_or_else(|| {
        Error::new(ErrorKind::InvalidNumber)
            .with_message("number payload overflows the f64 range")
            .with_token(raw)
    })?;
    Ok(Value::Number(number))
}

/// Decode a `BOOL` payload using the conventional truthy/falsy token set.
pub fn parse_boolean(raw: &str) -> Result<bool, Error> {
    match raw.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(Error::new(ErrorKind::InvalidBoolean)
            .with_message("boolean payload is not a recognized token")
            .with_token(raw)),
    }
}

/// Decode a `NULL` payload. The caller keeps the field (as boolean `true`)
/// only when the flag is true; `false` or a parse failure omits it.
pub fn parse_null_flag(raw: &str) -> Result<bool, Error> {
    parse_boolean(raw)
}
