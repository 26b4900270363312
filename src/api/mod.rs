//! Boundary with the external prescription API: JSON shapes in, typed
//! domain records out. Transport is owned by the hosting application.

pub mod error;
pub mod types;

pub use error::WireError;
pub use types::{
    parse_dose_logs, parse_prescriptions, DoseLogDto, PrescriptionDto, ScheduleDaysDto, StatusDto,
    TimeOfDayDto, WeekdayDto,
};
