use chrono::NaiveTime;

use crate::error::ApiError;

pub fn validate_day(value: u8) -> Result<u8, ApiError> {
    if value <= 6 {
        Ok(value)
    } else {
        Err(ApiError::BadRequest("day must be between 0 and 6".into()))
    }
}

/// Strict HH:MM check for API input. The scheduling core stays lenient about
/// whatever is already stored; this only guards what comes in over HTTP.
pub fn validate_time_string(value: &str) -> Result<(), ApiError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| ApiError::BadRequest(format!("invalid time {value:?}, expected HH:MM")))
}
