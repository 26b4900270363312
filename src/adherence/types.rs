use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::models::{ColorBand, PrescriptionStatus, RecordId};

// ---------------------------------------------------------------------------
// Errors and warnings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdherenceError {
    #[error("Invalid date range: end {end} precedes start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Data-quality signal attached to an otherwise usable result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AdherenceWarning {
    /// A dose log carried a status outside {Pending, Taken, Missed}.
    /// The entry is excluded from every count.
    #[serde(rename_all = "camelCase")]
    UnrecognizedStatus { entry_id: RecordId, value: String },
    /// More doses taken than scheduled; the rate was clamped to 100.
    #[serde(rename_all = "camelCase")]
    OverflowClamp { taken: u32, scheduled: u32 },
    /// Backend-reported pending count differs from
    /// `scheduled - (taken + missed)`.
    #[serde(rename_all = "camelCase")]
    PendingMismatch { reported: u32, derived: u32 },
}

impl std::fmt::Display for AdherenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedStatus { entry_id, value } => {
                write!(f, "dose log {entry_id} has unrecognized status {value:?}")
            }
            Self::OverflowClamp { taken, scheduled } => {
                write!(f, "{taken} doses taken but only {scheduled} scheduled")
            }
            Self::PendingMismatch { reported, derived } => {
                write!(f, "backend reports {reported} pending, schedule implies {derived}")
            }
        }
    }
}

/// A value together with the warnings raised while computing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessed<T> {
    pub value: T,
    pub warnings: Vec<AdherenceWarning>,
}

impl<T> Assessed<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<AdherenceWarning>) -> Self {
        Self { value, warnings }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_parts(self) -> (T, Vec<AdherenceWarning>) {
        (self.value, self.warnings)
    }
}

// ---------------------------------------------------------------------------
// Counts and summary
// ---------------------------------------------------------------------------

/// Disjoint outcome counts over a set of dose logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DoseCounts {
    pub taken: u32,
    pub missed: u32,
    pub pending: u32,
}

impl DoseCounts {
    pub fn total(&self) -> u32 {
        self.taken + self.missed + self.pending
    }
}

/// Per-prescription adherence projection consumed by every screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceSummary {
    pub scheduled: u32,
    pub taken: u32,
    pub missed: u32,
    pub pending: u32,
    /// Whole percentage in `0..=100`.
    pub rate: u8,
    pub status: PrescriptionStatus,
    pub color_band: ColorBand,
}
