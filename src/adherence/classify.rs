//! Outcome classification of dose logs.

use crate::models::{DoseLogEntry, DoseStatus, RecordedStatus};

use super::types::{AdherenceWarning, Assessed, DoseCounts};

/// Partition `logs` into taken / missed / pending counts.
///
/// Entries with an unrecognized status land in no bucket and produce one
/// `UnrecognizedStatus` warning each.
pub fn classify<'a, I>(logs: I) -> Assessed<DoseCounts>
where
    I: IntoIterator<Item = &'a DoseLogEntry>,
{
    let mut counts = DoseCounts::default();
    let mut warnings = Vec::new();

    for entry in logs {
        match &entry.status {
            RecordedStatus::Known(DoseStatus::Taken) => counts.taken += 1,
            RecordedStatus::Known(DoseStatus::Missed) => counts.missed += 1,
            RecordedStatus::Known(DoseStatus::Pending) => counts.pending += 1,
            RecordedStatus::Unrecognized(value) => {
                tracing::warn!(
                    entry_id = %entry.id,
                    value = %value,
                    "Dose log with unrecognized status excluded from counts"
                );
                warnings.push(AdherenceWarning::UnrecognizedStatus {
                    entry_id: entry.id.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    Assessed::with_warnings(counts, warnings)
}

/// Pending doses implied by the schedule: `max(scheduled - (taken + missed), 0)`.
pub fn derived_pending(scheduled: u32, taken: u32, missed: u32) -> u32 {
    scheduled.saturating_sub(taken.saturating_add(missed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;
    use chrono::NaiveDateTime;

    fn entry(id: &str, status: RecordedStatus) -> DoseLogEntry {
        DoseLogEntry {
            id: RecordId::from(id),
            prescription_id: RecordId::from("rx-1"),
            scheduled_at: NaiveDateTime::parse_from_str("2025-06-01 08:00", "%Y-%m-%d %H:%M")
                .unwrap(),
            status,
            taken_at: None,
        }
    }

    fn logs(statuses: &[DoseStatus]) -> Vec<DoseLogEntry> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| entry(&i.to_string(), (*s).into()))
            .collect()
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        use DoseStatus::*;
        let entries = logs(&[Taken, Taken, Missed, Pending, Taken, Pending]);
        let result = classify(&entries);
        assert!(result.is_clean());
        assert_eq!(result.value, DoseCounts { taken: 3, missed: 1, pending: 2 });
        assert_eq!(result.value.total() as usize, entries.len());
    }

    #[test]
    fn empty_input_counts_nothing() {
        let result = classify(&Vec::<DoseLogEntry>::new());
        assert_eq!(result.value, DoseCounts::default());
        assert!(result.is_clean());
    }

    #[test]
    fn unrecognized_status_warns_and_is_excluded() {
        let entries = vec![
            entry("a", DoseStatus::Taken.into()),
            entry("b", RecordedStatus::Unrecognized("Delayed".into())),
            entry("c", DoseStatus::Missed.into()),
        ];
        let result = classify(&entries);
        assert_eq!(result.value, DoseCounts { taken: 1, missed: 1, pending: 0 });
        assert_eq!(
            result.warnings,
            vec![AdherenceWarning::UnrecognizedStatus {
                entry_id: RecordId::from("b"),
                value: "Delayed".into(),
            }]
        );
    }

    #[test]
    fn classify_is_idempotent() {
        use DoseStatus::*;
        let entries = logs(&[Taken, Missed, Pending]);
        assert_eq!(classify(&entries), classify(&entries));
    }

    #[test]
    fn derived_pending_never_negative() {
        assert_eq!(derived_pending(10, 7, 1), 2);
        assert_eq!(derived_pending(10, 9, 1), 0);
        assert_eq!(derived_pending(10, 12, 1), 0);
        assert_eq!(derived_pending(0, 0, 0), 0);
    }

    #[test]
    fn reported_and_derived_pending_agree_when_consistent() {
        use DoseStatus::*;
        // Backend logged every scheduled dose: 10 entries for 10 scheduled.
        let entries = logs(&[Taken, Taken, Taken, Taken, Taken, Taken, Taken, Missed, Pending, Pending]);
        let counts = classify(&entries).value;
        assert_eq!(counts.pending, derived_pending(10, counts.taken, counts.missed));
    }
}
