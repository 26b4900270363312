//! Medication history screen: every dose log joined to its prescription,
//! with status / search / time-window filters and overall totals.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::adherence::{AdherenceCalculator, AdherenceWarning, DoseCounts};
use crate::models::{DoseLogEntry, Prescription, RecordId, RecordedStatus, StatusFilter};
use crate::session::{authorize_patient_view, AccessError, Session};

// ═══════════════════════════════════════════
// Query types
// ═══════════════════════════════════════════

/// Look-back window ending today (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "7 Days")]
    Days7,
    #[serde(rename = "30 Days")]
    Days30,
    #[serde(rename = "90 Days")]
    Days90,
    #[default]
    #[serde(rename = "All Time")]
    AllTime,
}

impl TimeWindow {
    pub fn days(&self) -> Option<i64> {
        match self {
            Self::Days7 => Some(7),
            Self::Days30 => Some(30),
            Self::Days90 => Some(90),
            Self::AllTime => None,
        }
    }

    /// Whether `date` lies in the window. The all-time window has no bounds.
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self.days() {
            Some(n) => date <= today && date > today - Duration::days(n),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryQuery {
    pub status: Option<StatusFilter>,
    /// Case-insensitive substring of medicine name or dosage.
    pub search: Option<String>,
    pub window: TimeWindow,
}

impl HistoryQuery {
    fn status_matches(&self, status: &RecordedStatus) -> bool {
        match (self.status.unwrap_or(StatusFilter::All), status.known()) {
            (StatusFilter::All, _) => true,
            (filter, Some(known)) => filter.matches(known),
            (_, None) => false,
        }
    }

    fn search_matches(&self, medicine_name: Option<&str>, dosage: Option<&str>) -> bool {
        let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let needle = needle.to_lowercase();
        [medicine_name, dosage]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

// ═══════════════════════════════════════════
// View types
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub dose_log_id: RecordId,
    pub prescription_id: RecordId,
    /// `None` when the log references a prescription not in the input.
    pub medicine_name: Option<String>,
    pub dosage: Option<String>,
    pub scheduled_at: NaiveDateTime,
    pub status: RecordedStatus,
    pub taken_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryTotals {
    pub taken: u32,
    pub missed: u32,
    pub pending: u32,
    /// Taken share of logged doses in the window.
    pub rate: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationHistory {
    pub entries: Vec<HistoryEntry>,
    pub totals: HistoryTotals,
    pub warnings: Vec<AdherenceWarning>,
}

// ═══════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════

/// Build the history screen for `patient_id`.
///
/// Totals cover every log in the time window; the status and search
/// filters narrow only the listed entries. Entries are newest first.
#[allow(clippy::too_many_arguments)]
pub fn build_history(
    calculator: &AdherenceCalculator,
    session: &Session,
    patient_id: &RecordId,
    roster: &[RecordId],
    prescriptions: &[Prescription],
    logs: &[DoseLogEntry],
    query: &HistoryQuery,
    today: NaiveDate,
) -> Result<MedicationHistory, AccessError> {
    authorize_patient_view(session, patient_id, roster)?;

    let by_id: HashMap<&RecordId, &Prescription> =
        prescriptions.iter().map(|p| (&p.id, p)).collect();

    let windowed: Vec<&DoseLogEntry> = logs
        .iter()
        .filter(|e| query.window.contains(e.scheduled_date(), today))
        .collect();

    let (counts, mut warnings) = calculator.classify(windowed.iter().copied()).into_parts();
    let totals = totals_from(calculator, counts, &mut warnings);

    let mut entries: Vec<HistoryEntry> = windowed
        .into_iter()
        .filter(|e| query.status_matches(&e.status))
        .filter_map(|e| {
            let prescription = by_id.get(&e.prescription_id);
            let medicine_name = prescription.map(|p| p.medicine_name.as_str());
            let dosage = prescription.map(|p| p.dosage.as_str());
            if !query.search_matches(medicine_name, dosage) {
                return None;
            }
            Some(HistoryEntry {
                dose_log_id: e.id.clone(),
                prescription_id: e.prescription_id.clone(),
                medicine_name: medicine_name.map(str::to_string),
                dosage: dosage.map(str::to_string),
                scheduled_at: e.scheduled_at,
                status: e.status.clone(),
                taken_at: e.taken_at,
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        b.scheduled_at
            .cmp(&a.scheduled_at)
            .then_with(|| a.dose_log_id.cmp(&b.dose_log_id))
    });

    tracing::debug!(
        patient_id = %patient_id,
        listed = entries.len(),
        logged = counts.total(),
        "Built medication history"
    );
    Ok(MedicationHistory {
        entries,
        totals,
        warnings,
    })
}

fn totals_from(
    calculator: &AdherenceCalculator,
    counts: DoseCounts,
    warnings: &mut Vec<AdherenceWarning>,
) -> HistoryTotals {
    let (rate, rate_warnings) = calculator
        .adherence_rate(counts.taken, counts.total())
        .into_parts();
    warnings.extend(rate_warnings);
    HistoryTotals {
        taken: counts.taken,
        missed: counts.missed,
        pending: counts.pending,
        rate,
    }
}
