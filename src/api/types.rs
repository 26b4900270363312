//! Request/response shapes of the external prescription API and their
//! conversion into domain records.
//!
//! The backend is loose about formats: identifiers arrive as numbers or
//! strings, dates sometimes carry a `T00:00:00` suffix, statuses may be
//! text in any case or an integer code. All of that is normalized here so
//! the adherence core only ever sees typed values.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::models::{DoseLogEntry, DoseStatus, Prescription, RecordId, RecordedStatus, ScheduleDays};

use super::error::WireError;

// ═══════════════════════════════════════════════════════════
// Incoming shapes
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDto {
    #[serde(alias = "prescriptionId")]
    pub id: RecordId,
    pub medicine_name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub instruction: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(alias = "times", alias = "prescriptionTimes")]
    pub schedule_times: Vec<TimeOfDayDto>,
    #[serde(alias = "days", alias = "prescriptionDays")]
    pub schedule_days: ScheduleDaysDto,
}

/// `"HH:MM"` or the nested `{ "timeOfDay": "HH:MM:SS" }` row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TimeOfDayDto {
    Plain(String),
    Row {
        #[serde(rename = "timeOfDay")]
        time_of_day: String,
    },
}

impl TimeOfDayDto {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(raw) | Self::Row { time_of_day: raw } => raw,
        }
    }
}

/// `[0-6, ...]` (plain numbers or `{ "dayOfWeek": n }` rows) or the literal `"daily"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScheduleDaysDto {
    Days(Vec<WeekdayDto>),
    Marker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WeekdayDto {
    Number(i64),
    Row {
        #[serde(rename = "dayOfWeek")]
        day_of_week: i64,
    },
}

impl WeekdayDto {
    pub fn number(&self) -> i64 {
        match self {
            Self::Number(n) | Self::Row { day_of_week: n } => *n,
        }
    }
}

/// Status as text (any case) or as the backend's integer code. Any other
/// JSON value is kept so the entry survives as unrecognized.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatusDto {
    Code(i64),
    Text(String),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseLogDto {
    #[serde(alias = "doseLogId")]
    pub id: RecordId,
    pub prescription_id: RecordId,
    pub scheduled_date_time: String,
    pub status: StatusDto,
    #[serde(default, alias = "takenAt")]
    pub taken_time: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// Conversion
// ═══════════════════════════════════════════════════════════

impl TryFrom<PrescriptionDto> for Prescription {
    type Error = WireError;

    fn try_from(dto: PrescriptionDto) -> Result<Self, Self::Error> {
        let schedule_times = dto
            .schedule_times
            .iter()
            .map(|t| parse_time_of_day(t.as_str()))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Prescription {
            id: dto.id,
            medicine_name: dto.medicine_name,
            dosage: dto.dosage,
            instruction: dto.instruction,
            start_date: parse_date("startDate", &dto.start_date)?,
            end_date: parse_date("endDate", &dto.end_date)?,
            schedule_times,
            schedule_days: dto.schedule_days.try_into()?,
        })
    }
}

impl TryFrom<ScheduleDaysDto> for ScheduleDays {
    type Error = WireError;

    fn try_from(dto: ScheduleDaysDto) -> Result<Self, Self::Error> {
        match dto {
            ScheduleDaysDto::Marker(marker) if marker.trim().eq_ignore_ascii_case("daily") => {
                Ok(ScheduleDays::Daily)
            }
            ScheduleDaysDto::Marker(marker) => Err(WireError::UnknownScheduleMarker(marker)),
            ScheduleDaysDto::Days(days) => days
                .into_iter()
                .map(|d| d.number())
                .map(|d| u8::try_from(d).ok().filter(|d| *d < 7).ok_or(WireError::WeekdayOutOfRange(d)))
                .collect::<Result<BTreeSet<_>, _>>()
                .map(ScheduleDays::Weekdays),
        }
    }
}

impl From<StatusDto> for RecordedStatus {
    fn from(dto: StatusDto) -> Self {
        match dto {
            StatusDto::Code(code) => DoseStatus::from_code(code)
                .map(RecordedStatus::Known)
                .unwrap_or_else(|| RecordedStatus::Unrecognized(code.to_string())),
            StatusDto::Text(text) => DoseStatus::from_label(&text)
                .map(RecordedStatus::Known)
                .unwrap_or(RecordedStatus::Unrecognized(text)),
            StatusDto::Other(value) => RecordedStatus::Unrecognized(value.to_string()),
        }
    }
}

impl TryFrom<DoseLogDto> for DoseLogEntry {
    type Error = WireError;

    fn try_from(dto: DoseLogDto) -> Result<Self, Self::Error> {
        let scheduled_at = parse_datetime("scheduledDateTime", &dto.scheduled_date_time)?;
        let taken_at = dto
            .taken_time
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|raw| parse_taken_time(raw, scheduled_at.date()))
            .transpose()?;

        Ok(DoseLogEntry {
            id: dto.id,
            prescription_id: dto.prescription_id,
            scheduled_at,
            status: dto.status.into(),
            taken_at,
        })
    }
}

/// Parse and convert a JSON array of prescriptions.
pub fn parse_prescriptions(json: &str) -> Result<Vec<Prescription>, WireError> {
    let dtos: Vec<PrescriptionDto> = serde_json::from_str(json)?;
    dtos.into_iter().map(Prescription::try_from).collect()
}

/// Parse and convert a JSON array of dose logs.
pub fn parse_dose_logs(json: &str) -> Result<Vec<DoseLogEntry>, WireError> {
    let dtos: Vec<DoseLogDto> = serde_json::from_str(json)?;
    let logs = dtos
        .into_iter()
        .map(DoseLogEntry::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(count = logs.len(), "Parsed dose logs");
    Ok(logs)
}

// ═══════════════════════════════════════════════════════════
// Field parsers
// ═══════════════════════════════════════════════════════════

/// `YYYY-MM-DD`, optionally followed by a `T…` time part which is ignored.
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, WireError> {
    let trimmed = raw.trim();
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| WireError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

/// `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, WireError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| WireError::InvalidTime {
            value: raw.to_string(),
        })
}

/// ISO local datetime with optional seconds/fraction, or RFC 3339 with an
/// offset. Offsets are dropped: the wall-clock time is kept as scheduled.
pub fn parse_datetime(field: &'static str, raw: &str) -> Result<NaiveDateTime, WireError> {
    let trimmed = raw.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.naive_local()))
        .map_err(|_| WireError::InvalidDateTime {
            field,
            value: raw.to_string(),
        })
}

/// Taken time is either a full timestamp or a bare time on the scheduled day.
fn parse_taken_time(raw: &str, scheduled_on: NaiveDate) -> Result<NaiveDateTime, WireError> {
    parse_datetime("takenTime", raw).or_else(|_| {
        parse_time_of_day(raw)
            .map(|t| scheduled_on.and_time(t))
            .map_err(|_| WireError::InvalidDateTime {
                field: "takenTime",
                value: raw.to_string(),
            })
    })
}
