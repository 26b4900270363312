//! Dose log state machine.
//!
//! ```text
//! Pending ──mark_taken──▶ Taken ──undo──▶ Pending
//!    │                      ▲
//!    └──(backend)──▶ Missed ┘ mark_taken_late
//! ```
//!
//! The core never mutates a dose log. A user action is validated against
//! the entry's current status and turned into a [`StatusChangeRequest`]
//! that the hosting app submits to the backend. `Pending → Missed` is
//! driven by the backend clock and has no user action.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DoseLogEntry, DoseStatus, RecordId, RecordedStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseAction {
    MarkTaken,
    Undo,
    MarkTakenLate,
}

impl DoseAction {
    pub const ALL: [DoseAction; 3] = [Self::MarkTaken, Self::Undo, Self::MarkTakenLate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarkTaken => "mark_taken",
            Self::Undo => "undo",
            Self::MarkTakenLate => "mark_taken_late",
        }
    }
}

/// Target status of `action` from `current`, or `None` when not allowed.
pub fn next_status(current: DoseStatus, action: DoseAction) -> Option<DoseStatus> {
    match (current, action) {
        (DoseStatus::Pending, DoseAction::MarkTaken) => Some(DoseStatus::Taken),
        (DoseStatus::Taken, DoseAction::Undo) => Some(DoseStatus::Pending),
        (DoseStatus::Missed, DoseAction::MarkTakenLate) => Some(DoseStatus::Taken),
        _ => None,
    }
}

/// Actions a user may take on `entry` right now.
pub fn available_actions(entry: &DoseLogEntry) -> Vec<DoseAction> {
    match entry.status.known() {
        Some(current) => DoseAction::ALL
            .into_iter()
            .filter(|a| next_status(current, *a).is_some())
            .collect(),
        None => Vec::new(),
    }
}

/// Outbound request handed to the external API layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    /// Idempotency key for the submission.
    pub request_id: Uuid,
    pub dose_log_id: RecordId,
    pub action: DoseAction,
    pub from: DoseStatus,
    pub to: DoseStatus,
    /// Set for transitions into `Taken`.
    pub taken_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot {} dose log {entry_id} while it is {status}", .action.as_str())]
    NotAllowed {
        entry_id: RecordId,
        status: DoseStatus,
        action: DoseAction,
    },
    #[error("Dose log {entry_id} has unrecognized status {value:?}")]
    UnrecognizedStatus { entry_id: RecordId, value: String },
}

/// Validate `action` on `entry` and build the request to submit.
pub fn plan_transition(
    entry: &DoseLogEntry,
    action: DoseAction,
    now: NaiveDateTime,
) -> Result<StatusChangeRequest, TransitionError> {
    let current = match &entry.status {
        RecordedStatus::Known(status) => *status,
        RecordedStatus::Unrecognized(value) => {
            return Err(TransitionError::UnrecognizedStatus {
                entry_id: entry.id.clone(),
                value: value.clone(),
            })
        }
    };

    let to = next_status(current, action).ok_or_else(|| TransitionError::NotAllowed {
        entry_id: entry.id.clone(),
        status: current,
        action,
    })?;

    let request = StatusChangeRequest {
        request_id: Uuid::new_v4(),
        dose_log_id: entry.id.clone(),
        action,
        from: current,
        to,
        taken_at: (to == DoseStatus::Taken).then_some(now),
    };
    tracing::info!(
        dose_log_id = %entry.id,
        action = action.as_str(),
        from = %current,
        to = %to,
        "Planned dose status change"
    );
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn entry(status: RecordedStatus) -> DoseLogEntry {
        DoseLogEntry {
            id: RecordId::from("log-1"),
            prescription_id: RecordId::from("rx-1"),
            scheduled_at: at("2025-06-01 08:00"),
            status,
            taken_at: None,
        }
    }

    #[test]
    fn allowed_transitions() {
        assert_eq!(next_status(DoseStatus::Pending, DoseAction::MarkTaken), Some(DoseStatus::Taken));
        assert_eq!(next_status(DoseStatus::Taken, DoseAction::Undo), Some(DoseStatus::Pending));
        assert_eq!(
            next_status(DoseStatus::Missed, DoseAction::MarkTakenLate),
            Some(DoseStatus::Taken)
        );
    }

    #[test]
    fn disallowed_transitions() {
        assert_eq!(next_status(DoseStatus::Pending, DoseAction::Undo), None);
        assert_eq!(next_status(DoseStatus::Pending, DoseAction::MarkTakenLate), None);
        assert_eq!(next_status(DoseStatus::Taken, DoseAction::MarkTaken), None);
        assert_eq!(next_status(DoseStatus::Missed, DoseAction::MarkTaken), None);
        assert_eq!(next_status(DoseStatus::Missed, DoseAction::Undo), None);
    }

    #[test]
    fn no_user_action_reaches_missed() {
        for status in [DoseStatus::Pending, DoseStatus::Taken, DoseStatus::Missed] {
            for action in DoseAction::ALL {
                assert_ne!(next_status(status, action), Some(DoseStatus::Missed));
            }
        }
    }

    #[test]
    fn available_actions_per_status() {
        assert_eq!(available_actions(&entry(DoseStatus::Pending.into())), vec![DoseAction::MarkTaken]);
        assert_eq!(available_actions(&entry(DoseStatus::Taken.into())), vec![DoseAction::Undo]);
        assert_eq!(
            available_actions(&entry(DoseStatus::Missed.into())),
            vec![DoseAction::MarkTakenLate]
        );
        assert!(available_actions(&entry(RecordedStatus::Unrecognized("x".into()))).is_empty());
    }

    #[test]
    fn mark_taken_request_carries_time() {
        let e = entry(DoseStatus::Pending.into());
        let now = at("2025-06-01 08:10");
        let req = plan_transition(&e, DoseAction::MarkTaken, now).unwrap();
        assert_eq!(req.dose_log_id, RecordId::from("log-1"));
        assert_eq!(req.from, DoseStatus::Pending);
        assert_eq!(req.to, DoseStatus::Taken);
        assert_eq!(req.taken_at, Some(now));
    }

    #[test]
    fn undo_clears_taken_time() {
        let e = entry(DoseStatus::Taken.into());
        let req = plan_transition(&e, DoseAction::Undo, at("2025-06-01 09:00")).unwrap();
        assert_eq!(req.to, DoseStatus::Pending);
        assert_eq!(req.taken_at, None);
    }

    #[test]
    fn plan_does_not_mutate_entry() {
        let e = entry(DoseStatus::Missed.into());
        let _ = plan_transition(&e, DoseAction::MarkTakenLate, at("2025-06-01 12:00")).unwrap();
        assert_eq!(e.status, RecordedStatus::Known(DoseStatus::Missed));
    }

    #[test]
    fn request_ids_are_unique() {
        let e = entry(DoseStatus::Pending.into());
        let now = at("2025-06-01 08:10");
        let a = plan_transition(&e, DoseAction::MarkTaken, now).unwrap();
        let b = plan_transition(&e, DoseAction::MarkTaken, now).unwrap();
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn invalid_action_is_rejected() {
        let e = entry(DoseStatus::Taken.into());
        let err = plan_transition(&e, DoseAction::MarkTaken, at("2025-06-01 08:10")).unwrap_err();
        assert_eq!(
            err,
            TransitionError::NotAllowed {
                entry_id: RecordId::from("log-1"),
                status: DoseStatus::Taken,
                action: DoseAction::MarkTaken,
            }
        );
        assert_eq!(err.to_string(), "Cannot mark_taken dose log log-1 while it is taken");
    }

    #[test]
    fn unrecognized_status_cannot_transition() {
        let e = entry(RecordedStatus::Unrecognized("Delayed".into()));
        let err = plan_transition(&e, DoseAction::MarkTaken, at("2025-06-01 08:10")).unwrap_err();
        assert!(matches!(err, TransitionError::UnrecognizedStatus { value, .. } if value == "Delayed"));
    }

    #[test]
    fn request_serializes_camel_case() {
        let e = entry(DoseStatus::Pending.into());
        let req = plan_transition(&e, DoseAction::MarkTaken, at("2025-06-01 08:10")).unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["doseLogId"], "log-1");
        assert_eq!(json["action"], "mark_taken");
        assert_eq!(json["from"], "pending");
        assert_eq!(json["to"], "taken");
        assert_eq!(json["takenAt"], "2025-06-01T08:10:00");
    }
}
