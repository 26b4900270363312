use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::enums::DoseStatus;
use super::RecordId;

/// Status as recorded by the backend. Values outside the known set are
/// kept verbatim so callers can report the contract mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecordedStatus {
    Known(DoseStatus),
    Unrecognized(String),
}

impl RecordedStatus {
    pub fn known(&self) -> Option<DoseStatus> {
        match self {
            Self::Known(status) => Some(*status),
            Self::Unrecognized(_) => None,
        }
    }
}

impl From<DoseStatus> for RecordedStatus {
    fn from(status: DoseStatus) -> Self {
        Self::Known(status)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseLogEntry {
    pub id: RecordId,
    pub prescription_id: RecordId,
    pub scheduled_at: NaiveDateTime,
    pub status: RecordedStatus,
    pub taken_at: Option<NaiveDateTime>,
}

impl DoseLogEntry {
    pub fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_at.date()
    }

    /// Minutes between the scheduled time and the recorded intake.
    /// Negative when taken early.
    pub fn minutes_late(&self) -> Option<i64> {
        self.taken_at
            .map(|taken| (taken - self.scheduled_at).num_minutes())
    }
}
