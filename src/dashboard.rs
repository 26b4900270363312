//! Doctor-facing patient medication summary.
//!
//! One card per prescription: identity fields, the shared adherence
//! summary, and the most recent doses newest-first. A prescription whose
//! dates cannot be counted is listed under `skipped` with the reason
//! instead of failing the whole screen.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::adherence::{AdherenceCalculator, AdherenceSummary, AdherenceWarning};
use crate::models::{DoseLogEntry, Prescription, RecordId, RecordedStatus};
use crate::session::{authorize_patient_view, AccessError, Session};

/// Doses shown per card.
pub const RECENT_DOSE_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentDose {
    pub dose_log_id: RecordId,
    pub scheduled_at: NaiveDateTime,
    pub status: RecordedStatus,
    pub minutes_late: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionCard {
    pub id: RecordId,
    pub medicine_name: String,
    pub dosage: String,
    pub instruction: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub adherence: AdherenceSummary,
    pub recent_doses: Vec<RecentDose>,
    pub warnings: Vec<AdherenceWarning>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPrescription {
    pub id: RecordId,
    pub medicine_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientMedicationSummary {
    pub patient_id: RecordId,
    pub cards: Vec<PrescriptionCard>,
    pub skipped: Vec<SkippedPrescription>,
}

/// Newest `limit` doses, ties broken by id for a stable order.
pub fn recent_doses(logs: &[&DoseLogEntry], limit: usize) -> Vec<RecentDose> {
    let mut sorted: Vec<&DoseLogEntry> = logs.to_vec();
    sorted.sort_by(|a, b| {
        b.scheduled_at
            .cmp(&a.scheduled_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted
        .into_iter()
        .take(limit)
        .map(|e| RecentDose {
            dose_log_id: e.id.clone(),
            scheduled_at: e.scheduled_at,
            status: e.status.clone(),
            minutes_late: e.minutes_late(),
        })
        .collect()
}

/// Build the summary screen for `patient_id`.
///
/// `prescriptions` and `logs` are the patient's records as returned by the
/// backend; `roster` is the doctor's patient list.
pub fn build_patient_summary(
    calculator: &AdherenceCalculator,
    session: &Session,
    patient_id: &RecordId,
    roster: &[RecordId],
    prescriptions: &[Prescription],
    logs: &[DoseLogEntry],
    today: NaiveDate,
) -> Result<PatientMedicationSummary, AccessError> {
    authorize_patient_view(session, patient_id, roster)?;

    let mut cards = Vec::with_capacity(prescriptions.len());
    let mut skipped = Vec::new();

    for assessment in calculator.summarize_all(prescriptions, logs, today) {
        let prescription = assessment.prescription;
        match assessment.summary {
            Ok(assessed) => {
                if !assessed.is_clean() {
                    tracing::debug!(
                        prescription_id = %prescription.id,
                        warnings = assessed.warnings.len(),
                        "Prescription card carries data-quality warnings"
                    );
                }
                let (adherence, warnings) = assessed.into_parts();
                cards.push(PrescriptionCard {
                    id: prescription.id.clone(),
                    medicine_name: prescription.medicine_name.clone(),
                    dosage: prescription.dosage.clone(),
                    instruction: prescription.instruction.clone(),
                    start_date: prescription.start_date,
                    end_date: prescription.end_date,
                    adherence,
                    recent_doses: recent_doses(&assessment.logs, RECENT_DOSE_LIMIT),
                    warnings,
                });
            }
            Err(e) => {
                tracing::warn!(prescription_id = %prescription.id, error = %e, "Skipping prescription card");
                skipped.push(SkippedPrescription {
                    id: prescription.id.clone(),
                    medicine_name: prescription.medicine_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        patient_id = %patient_id,
        cards = cards.len(),
        skipped = skipped.len(),
        "Built patient medication summary"
    );
    Ok(PatientMedicationSummary {
        patient_id: patient_id.clone(),
        cards,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorBand, DoseStatus, PrescriptionStatus, ScheduleDays};
    use chrono::{Duration, NaiveTime};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rx(id: &str, name: &str, start: &str, end: &str) -> Prescription {
        Prescription {
            id: RecordId::from(id),
            medicine_name: name.into(),
            dosage: "10mg".into(),
            instruction: "Daily".into(),
            start_date: date(start),
            end_date: date(end),
            schedule_times: [
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            ]
            .into_iter()
            .collect(),
            schedule_days: ScheduleDays::Daily,
        }
    }

    /// Twice-daily logs from `start`, one status per slot.
    fn logs(rx_id: &str, start: &str, statuses: &[DoseStatus]) -> Vec<DoseLogEntry> {
        let base = date(start).and_hms_opt(8, 0, 0).unwrap();
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| DoseLogEntry {
                id: RecordId::from(format!("{rx_id}-{i:02}")),
                prescription_id: RecordId::from(rx_id),
                scheduled_at: base + Duration::hours(12 * i as i64),
                status: (*s).into(),
                taken_at: None,
            })
            .collect()
    }

    fn roster() -> Vec<RecordId> {
        vec![RecordId::from("pat-1")]
    }

    #[test]
    fn builds_cards_from_shared_calculator() {
        use DoseStatus::*;
        let calc = AdherenceCalculator::default();
        let rxs = vec![rx("1", "Amoxicillin", "2025-06-01", "2025-06-05")];
        let entries = logs("1", "2025-06-01", &[Taken, Taken, Taken, Taken, Taken, Taken, Taken, Taken, Taken, Missed]);

        let summary = build_patient_summary(
            &calc,
            &Session::doctor("doc-1"),
            &RecordId::from("pat-1"),
            &roster(),
            &rxs,
            &entries,
            date("2025-06-08"),
        )
        .unwrap();

        assert_eq!(summary.cards.len(), 1);
        let card = &summary.cards[0];
        assert_eq!(card.medicine_name, "Amoxicillin");
        assert_eq!(card.adherence.scheduled, 10);
        assert_eq!(card.adherence.rate, 90);
        assert_eq!(card.adherence.status, PrescriptionStatus::Completed);
        assert_eq!(card.adherence.color_band, ColorBand::Good);
        assert!(card.warnings.is_empty());
    }

    #[test]
    fn recent_doses_are_newest_first_and_limited() {
        use DoseStatus::*;
        let entries = logs("1", "2025-06-01", &[Taken, Missed, Taken, Taken, Pending, Pending, Pending]);
        let refs: Vec<&DoseLogEntry> = entries.iter().collect();

        let recent = recent_doses(&refs, RECENT_DOSE_LIMIT);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].dose_log_id, RecordId::from("1-06"));
        assert_eq!(recent[4].dose_log_id, RecordId::from("1-02"));
        assert!(recent.windows(2).all(|w| w[0].scheduled_at >= w[1].scheduled_at));
    }

    #[test]
    fn recent_doses_stay_with_their_prescription() {
        use DoseStatus::*;
        let calc = AdherenceCalculator::default();
        let rxs = vec![
            rx("1", "Amoxicillin", "2025-06-01", "2025-06-05"),
            rx("2", "Metformin", "2025-06-01", "2025-06-05"),
        ];
        let mut entries = logs("1", "2025-06-01", &[Taken, Taken]);
        entries.extend(logs("2", "2025-06-03", &[Missed, Missed, Missed]));

        let summary = build_patient_summary(
            &calc,
            &Session::patient("pat-1"),
            &RecordId::from("pat-1"),
            &[],
            &rxs,
            &entries,
            date("2025-06-04"),
        )
        .unwrap();

        let first: Vec<&str> = summary.cards[0].recent_doses.iter().map(|d| d.dose_log_id.as_str()).collect();
        let second: Vec<&str> = summary.cards[1].recent_doses.iter().map(|d| d.dose_log_id.as_str()).collect();
        assert_eq!(first, vec!["1-01", "1-00"]);
        assert_eq!(second, vec!["2-02", "2-01", "2-00"]);
        assert_eq!(summary.cards[1].adherence.missed, 3);
    }

    #[test]
    fn invalid_prescription_is_skipped_not_fatal() {
        let calc = AdherenceCalculator::default();
        let rxs = vec![
            rx("bad", "Broken", "2025-06-05", "2025-06-01"),
            rx("good", "Metformin", "2025-06-01", "2025-06-02"),
        ];

        let summary = build_patient_summary(
            &calc,
            &Session::patient("pat-1"),
            &RecordId::from("pat-1"),
            &[],
            &rxs,
            &[],
            date("2025-06-01"),
        )
        .unwrap();

        assert_eq!(summary.cards.len(), 1);
        assert_eq!(summary.cards[0].id, RecordId::from("good"));
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].id, RecordId::from("bad"));
        assert!(summary.skipped[0].reason.contains("precedes"));
    }

    #[test]
    fn cards_follow_prescription_order() {
        let calc = AdherenceCalculator::default();
        let rxs = vec![
            rx("2", "Lisinopril", "2025-06-01", "2025-06-30"),
            rx("1", "Amoxicillin", "2025-06-01", "2025-06-05"),
        ];
        let summary = build_patient_summary(
            &calc,
            &Session::patient("pat-1"),
            &RecordId::from("pat-1"),
            &[],
            &rxs,
            &[],
            date("2025-06-03"),
        )
        .unwrap();
        let ids: Vec<&str> = summary.cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn unassigned_doctor_is_denied() {
        let calc = AdherenceCalculator::default();
        let err = build_patient_summary(
            &calc,
            &Session::doctor("doc-2"),
            &RecordId::from("pat-9"),
            &roster(),
            &[],
            &[],
            date("2025-06-03"),
        )
        .unwrap_err();
        assert!(matches!(err, AccessError::Denied { .. }));
    }
}
