use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;

use super::RecordId;

/// Days of the week a prescription applies to.
///
/// Weekday numbers follow the backend convention: 0 = Sunday … 6 = Saturday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScheduleDays {
    Daily,
    Weekdays(BTreeSet<u8>),
}

impl ScheduleDays {
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekdays(days) => days.contains(&weekday_number(date)),
        }
    }

    /// True when the schedule selects no day at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Weekdays(days) if days.is_empty())
    }

    /// True when every day of the week is selected, explicitly or not.
    pub fn covers_every_day(&self) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekdays(days) => (0..7).all(|d| days.contains(&d)),
        }
    }
}

/// Backend weekday number of `date` (0 = Sunday).
pub fn weekday_number(date: NaiveDate) -> u8 {
    // num_days_from_sunday is always < 7
    date.weekday().num_days_from_sunday() as u8
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: RecordId,
    pub medicine_name: String,
    pub dosage: String,
    pub instruction: String,
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub schedule_times: BTreeSet<NaiveTime>,
    pub schedule_days: ScheduleDays,
}

impl Prescription {
    /// Distinct dosing times per applicable day.
    pub fn doses_per_day(&self) -> u32 {
        // A day has at most 86 400 distinct NaiveTime values at second
        // resolution, well inside u32.
        self.schedule_times.len() as u32
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date && self.schedule_days.applies_on(date)
    }
}
