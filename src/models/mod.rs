pub mod dose_log;
pub mod enums;
pub mod prescription;

use serde::{Deserialize, Deserializer, Serialize};

pub use dose_log::{DoseLogEntry, RecordedStatus};
pub use enums::{ColorBand, DoseStatus, PrescriptionStatus, Role, StatusFilter};
pub use prescription::{Prescription, ScheduleDays};

/// Opaque backend identifier. The API sends these as JSON integers or
/// strings depending on the endpoint; both normalize to the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Self::from(n),
            Raw::Text(s) => Self::from(s),
        })
    }
}
