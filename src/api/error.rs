//! Errors raised while converting backend JSON into domain records.

/// Wire-level conversion failures. Each names the offending field and the
/// raw value so the caller can log the exact contract mismatch.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid date in {field}: {value:?}")]
    InvalidDate { field: &'static str, value: String },
    #[error("Invalid time of day: {value:?}")]
    InvalidTime { value: String },
    #[error("Invalid timestamp in {field}: {value:?}")]
    InvalidDateTime { field: &'static str, value: String },
    #[error("Weekday must be 0-6 (Sunday = 0), got {0}")]
    WeekdayOutOfRange(i64),
    #[error("Unknown schedule-days marker: {0:?}")]
    UnknownScheduleMarker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_include_raw_value() {
        let err = WireError::InvalidDate {
            field: "startDate",
            value: "06/01/2025".into(),
        };
        assert_eq!(err.to_string(), "Invalid date in startDate: \"06/01/2025\"");
        assert_eq!(
            WireError::WeekdayOutOfRange(7).to_string(),
            "Weekday must be 0-6 (Sunday = 0), got 7"
        );
    }
}
