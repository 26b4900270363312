pub mod adherence; // Shared adherence calculator
pub mod api; // Wire records from the prescription API
pub mod config;
pub mod dashboard; // Doctor patient summary
pub mod dose_state; // Dose status transitions
pub mod history; // Medication history screen
pub mod models;
pub mod session; // Session + patient access cascade
pub mod today; // Patient today screen

pub use adherence::{
    AdherenceCalculator, AdherenceError, AdherenceSummary, AdherenceWarning, Assessed, DoseCounts,
    PrescriptionAssessment,
};
pub use config::{AdherencePolicy, ConfigError, DayCounting, PendingSource};
pub use models::{
    ColorBand, DoseLogEntry, DoseStatus, Prescription, PrescriptionStatus, RecordId, RecordedStatus,
    Role, ScheduleDays, StatusFilter,
};
pub use session::{AccessError, Session};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber for hosting apps that have none.
///
/// `RUST_LOG` wins over [`config::default_log_filter`]. Returns `false`
/// when a global subscriber is already set.
pub fn init_tracing() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
    installed
}
