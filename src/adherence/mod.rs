//! Adherence computation shared by every screen.
//!
//! Turns a prescription's static schedule plus its realized dose logs into
//! an [`AdherenceSummary`]: scheduled count, outcome counts, rate, status
//! label and color band. All functions are pure; data-quality problems
//! travel back as [`AdherenceWarning`]s next to the value.

pub mod classify;
pub mod schedule;
pub mod types;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::{AdherencePolicy, PendingSource};
use crate::models::{ColorBand, DoseLogEntry, Prescription, PrescriptionStatus, RecordId};

pub use classify::{classify, derived_pending};
pub use schedule::scheduled_count;
pub use types::{AdherenceError, AdherenceSummary, AdherenceWarning, Assessed, DoseCounts};

// ═══════════════════════════════════════════════════════════
// Free functions
// ═══════════════════════════════════════════════════════════

/// `round(100 × taken / scheduled)`, halves rounding up; 0 when nothing
/// is scheduled. A `taken` above `scheduled` clamps to 100 and warns.
pub fn adherence_rate(taken: u32, scheduled: u32) -> Assessed<u8> {
    if scheduled == 0 {
        return Assessed::clean(0);
    }
    if taken > scheduled {
        tracing::warn!(taken, scheduled, "Taken doses exceed scheduled; clamping rate to 100");
        return Assessed::with_warnings(
            100,
            vec![AdherenceWarning::OverflowClamp { taken, scheduled }],
        );
    }
    let (taken, scheduled) = (u64::from(taken), u64::from(scheduled));
    let rate = (200 * taken + scheduled) / (2 * scheduled);
    // taken <= scheduled bounds rate to 100
    Assessed::clean(rate as u8)
}

/// Lifecycle label. `today == end_date` is still ongoing.
pub fn derive_status(
    prescription: &Prescription,
    rate: u8,
    today: NaiveDate,
    completion_threshold: u8,
) -> PrescriptionStatus {
    if today > prescription.end_date {
        if rate >= completion_threshold {
            PrescriptionStatus::Completed
        } else {
            PrescriptionStatus::CompletedWithMissedDoses
        }
    } else {
        PrescriptionStatus::Ongoing
    }
}

pub fn color_band(rate: u8, policy: &AdherencePolicy) -> ColorBand {
    if rate >= policy.good_threshold {
        ColorBand::Good
    } else if rate >= policy.warning_threshold {
        ColorBand::Warning
    } else {
        ColorBand::Critical
    }
}

// ═══════════════════════════════════════════════════════════
// Calculator
// ═══════════════════════════════════════════════════════════

/// Policy-bound entry point. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct AdherenceCalculator {
    policy: AdherencePolicy,
}

impl AdherenceCalculator {
    pub fn new(policy: AdherencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AdherencePolicy {
        &self.policy
    }

    pub fn scheduled_count(&self, prescription: &Prescription) -> Result<u32, AdherenceError> {
        schedule::scheduled_count(prescription, self.policy.day_counting)
    }

    pub fn classify<'a, I>(&self, logs: I) -> Assessed<DoseCounts>
    where
        I: IntoIterator<Item = &'a DoseLogEntry>,
    {
        classify::classify(logs)
    }

    pub fn adherence_rate(&self, taken: u32, scheduled: u32) -> Assessed<u8> {
        adherence_rate(taken, scheduled)
    }

    pub fn derive_status(
        &self,
        prescription: &Prescription,
        rate: u8,
        today: NaiveDate,
    ) -> PrescriptionStatus {
        derive_status(prescription, rate, today, self.policy.completion_threshold)
    }

    pub fn color_band(&self, rate: u8) -> ColorBand {
        color_band(rate, &self.policy)
    }

    /// Summarize one prescription. Logs owned by other prescriptions are
    /// ignored, so callers may pass a patient's full log list.
    pub fn summarize(
        &self,
        prescription: &Prescription,
        logs: &[DoseLogEntry],
        today: NaiveDate,
    ) -> Result<Assessed<AdherenceSummary>, AdherenceError> {
        let owned = logs.iter().filter(|e| e.prescription_id == prescription.id);
        self.summarize_owned(prescription, owned, today)
    }

    /// Summarize every prescription, grouping `logs` by owner once.
    /// Results keep the order of `prescriptions` and carry the owned logs
    /// so callers can build further projections without regrouping.
    pub fn summarize_all<'a>(
        &self,
        prescriptions: &'a [Prescription],
        logs: &'a [DoseLogEntry],
        today: NaiveDate,
    ) -> Vec<PrescriptionAssessment<'a>> {
        let by_owner = group_by_prescription(logs);
        prescriptions
            .iter()
            .map(|p| {
                let owned = by_owner.get(&p.id).cloned().unwrap_or_default();
                let summary = self.summarize_owned(p, owned.iter().copied(), today);
                PrescriptionAssessment {
                    prescription: p,
                    logs: owned,
                    summary,
                }
            })
            .collect()
    }

    fn summarize_owned<'a, I>(
        &self,
        prescription: &Prescription,
        owned: I,
        today: NaiveDate,
    ) -> Result<Assessed<AdherenceSummary>, AdherenceError>
    where
        I: IntoIterator<Item = &'a DoseLogEntry>,
    {
        let scheduled = self.scheduled_count(prescription)?;
        let (counts, mut warnings) = classify::classify(owned).into_parts();

        let derived = derived_pending(scheduled, counts.taken, counts.missed);
        if derived != counts.pending {
            tracing::debug!(
                prescription_id = %prescription.id,
                reported = counts.pending,
                derived,
                "Pending count disagrees with schedule"
            );
            warnings.push(AdherenceWarning::PendingMismatch {
                reported: counts.pending,
                derived,
            });
        }
        let pending = match self.policy.pending_source {
            PendingSource::Reported => counts.pending,
            PendingSource::Derived => derived,
        };

        let (rate, rate_warnings) = adherence_rate(counts.taken, scheduled).into_parts();
        warnings.extend(rate_warnings);

        let summary = AdherenceSummary {
            scheduled,
            taken: counts.taken,
            missed: counts.missed,
            pending,
            rate,
            status: self.derive_status(prescription, rate, today),
            color_band: self.color_band(rate),
        };
        tracing::debug!(
            prescription_id = %prescription.id,
            scheduled,
            rate,
            status = %summary.status,
            warnings = warnings.len(),
            "Computed adherence summary"
        );
        Ok(Assessed::with_warnings(summary, warnings))
    }
}

/// One prescription's summary with the dose logs it was computed from.
#[derive(Debug)]
pub struct PrescriptionAssessment<'a> {
    pub prescription: &'a Prescription,
    /// Logs owned by `prescription`, in input order.
    pub logs: Vec<&'a DoseLogEntry>,
    pub summary: Result<Assessed<AdherenceSummary>, AdherenceError>,
}

/// Index dose logs by owning prescription, preserving input order.
pub fn group_by_prescription(logs: &[DoseLogEntry]) -> HashMap<RecordId, Vec<&DoseLogEntry>> {
    let mut map: HashMap<RecordId, Vec<&DoseLogEntry>> = HashMap::new();
    for entry in logs {
        map.entry(entry.prescription_id.clone()).or_default().push(entry);
    }
    map
}
