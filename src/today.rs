//! Patient "today" screen: the day's doses in time order with the actions
//! each one allows, plus schedule slots the backend has not logged yet.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::dose_state::{available_actions, DoseAction};
use crate::models::{DoseLogEntry, Prescription, RecordId, RecordedStatus, Role};
use crate::session::{AccessError, Session};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayDose {
    pub dose_log_id: RecordId,
    pub prescription_id: RecordId,
    pub medicine_name: Option<String>,
    pub dosage: Option<String>,
    pub instruction: Option<String>,
    pub scheduled_time: NaiveTime,
    pub status: RecordedStatus,
    pub taken_at: Option<NaiveDateTime>,
    pub actions: Vec<DoseAction>,
}

/// A scheduled slot with no dose log yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnloggedDose {
    pub prescription_id: RecordId,
    pub medicine_name: String,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayView {
    pub date: NaiveDate,
    pub doses: Vec<TodayDose>,
    pub unlogged: Vec<UnloggedDose>,
}

/// Build today's dose list for the patient in `session`.
pub fn build_today(
    session: &Session,
    prescriptions: &[Prescription],
    logs: &[DoseLogEntry],
    today: NaiveDate,
) -> Result<TodayView, AccessError> {
    session.require_role(Role::Patient)?;

    let by_id: HashMap<&RecordId, &Prescription> =
        prescriptions.iter().map(|p| (&p.id, p)).collect();

    let todays: Vec<&DoseLogEntry> = logs
        .iter()
        .filter(|e| e.scheduled_date() == today)
        .collect();

    let logged: HashSet<(&RecordId, NaiveTime)> = todays
        .iter()
        .map(|e| (&e.prescription_id, e.scheduled_at.time()))
        .collect();

    let mut doses: Vec<TodayDose> = todays
        .iter()
        .map(|e| {
            let prescription = by_id.get(&e.prescription_id);
            TodayDose {
                dose_log_id: e.id.clone(),
                prescription_id: e.prescription_id.clone(),
                medicine_name: prescription.map(|p| p.medicine_name.clone()),
                dosage: prescription.map(|p| p.dosage.clone()),
                instruction: prescription.map(|p| p.instruction.clone()),
                scheduled_time: e.scheduled_at.time(),
                status: e.status.clone(),
                taken_at: e.taken_at,
                actions: available_actions(e),
            }
        })
        .collect();
    doses.sort_by(|a, b| {
        a.scheduled_time
            .cmp(&b.scheduled_time)
            .then_with(|| a.medicine_name.cmp(&b.medicine_name))
            .then_with(|| a.dose_log_id.cmp(&b.dose_log_id))
    });

    let logged = &logged;
    let mut unlogged: Vec<UnloggedDose> = prescriptions
        .iter()
        .filter(|p| p.is_active_on(today))
        .flat_map(move |p| {
            p.schedule_times
                .iter()
                .filter(move |t| !logged.contains(&(&p.id, **t)))
                .map(move |t| UnloggedDose {
                    prescription_id: p.id.clone(),
                    medicine_name: p.medicine_name.clone(),
                    time: *t,
                })
        })
        .collect();
    unlogged.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.medicine_name.cmp(&b.medicine_name))
    });

    tracing::debug!(
        patient_id = %session.profile_id(),
        date = %today,
        doses = doses.len(),
        unlogged = unlogged.len(),
        "Built today view"
    );
    Ok(TodayView {
        date: today,
        doses,
        unlogged,
    })
}
