//! Scheduled-dose counting over a prescription's inclusive date range.

use crate::config::DayCounting;
use crate::models::prescription::weekday_number;
use crate::models::{Prescription, ScheduleDays};

use super::types::AdherenceError;

/// Number of dates in `start..=end`. Fails when `end < start`.
pub fn total_days(prescription: &Prescription) -> Result<u32, AdherenceError> {
    let (start, end) = (prescription.start_date, prescription.end_date);
    if end < start {
        return Err(AdherenceError::InvalidRange { start, end });
    }
    let span = (end - start).num_days() + 1;
    Ok(u32::try_from(span).unwrap_or(u32::MAX))
}

/// Dates in the range that carry doses under `mode`.
pub fn dosing_days(prescription: &Prescription, mode: DayCounting) -> Result<u32, AdherenceError> {
    let total = total_days(prescription)?;
    let schedule = &prescription.schedule_days;
    let days = match schedule {
        _ if mode == DayCounting::CalendarDays || schedule.covers_every_day() => total,
        _ if schedule.is_empty() => 0,
        ScheduleDays::Daily => total,
        ScheduleDays::Weekdays(selected) => {
            let first = u32::from(weekday_number(prescription.start_date));
            let full_weeks = total / 7;
            let remainder = total % 7;
            // Count selected weekdays in the trailing partial week.
            let tail = (0..remainder)
                .filter(|offset| {
                    let day = ((first + offset) % 7) as u8;
                    selected.contains(&day)
                })
                .count() as u32;
            let per_week = selected.iter().filter(|d| **d < 7).count() as u32;
            full_weeks.saturating_mul(per_week).saturating_add(tail)
        }
    };
    Ok(days)
}

/// `dosing_days × doses_per_day`.
pub fn scheduled_count(prescription: &Prescription, mode: DayCounting) -> Result<u32, AdherenceError> {
    let days = dosing_days(prescription, mode)?;
    Ok(days.saturating_mul(prescription.doses_per_day()))
}
