use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Dosewise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that overrides the policy file location.
pub const POLICY_ENV_VAR: &str = "DOSEWISE_POLICY";

const POLICY_FILE_NAME: &str = "adherence_policy.json";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "dosewise=info"
}

/// Get the application data directory (`<config dir>/dosewise`).
/// `None` when the platform reports no config directory.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dosewise"))
}

/// Resolve the policy file: `$DOSEWISE_POLICY` first, then the app data dir.
pub fn policy_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(POLICY_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    app_data_dir().map(|dir| dir.join(POLICY_FILE_NAME))
}

// ═══════════════════════════════════════════════════════════
// Adherence policy
// ═══════════════════════════════════════════════════════════

/// Where the pending count comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingSource {
    /// Count entries the backend marked `Pending`.
    #[default]
    Reported,
    /// `max(scheduled - (taken + missed), 0)`.
    Derived,
}

/// How days in a prescription's range are counted toward scheduled doses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCounting {
    /// Only dates whose weekday is in the schedule.
    #[default]
    QualifyingWeekdays,
    /// Every calendar date in the range, regardless of weekday selection.
    CalendarDays,
}

/// Thresholds and modes that drive adherence classification.
///
/// Thresholds are whole percentages in `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdherencePolicy {
    /// Minimum rate for a finished prescription to count as "Completed".
    pub completion_threshold: u8,
    /// Minimum rate for the `good` color band.
    pub good_threshold: u8,
    /// Minimum rate for the `warning` color band; below is `critical`.
    pub warning_threshold: u8,
    pub pending_source: PendingSource,
    pub day_counting: DayCounting,
}

impl Default for AdherencePolicy {
    fn default() -> Self {
        Self {
            completion_threshold: 90,
            good_threshold: 90,
            warning_threshold: 75,
            pending_source: PendingSource::default(),
            day_counting: DayCounting::default(),
        }
    }
}

impl AdherencePolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("completionThreshold", self.completion_threshold),
            ("goodThreshold", self.good_threshold),
            ("warningThreshold", self.warning_threshold),
        ] {
            if value > 100 {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if self.warning_threshold > self.good_threshold {
            return Err(ConfigError::ThresholdOrder {
                warning: self.warning_threshold,
                good: self.good_threshold,
            });
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let policy: Self = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid policy JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{name} must be between 0 and 100, got {value}")]
    ThresholdOutOfRange { name: &'static str, value: u8 },
    #[error("warningThreshold ({warning}) exceeds goodThreshold ({good})")]
    ThresholdOrder { warning: u8, good: u8 },
}

/// Load and validate a policy file. Missing keys take their defaults.
pub fn load_policy(path: &Path) -> Result<AdherencePolicy, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AdherencePolicy::from_json_str(&raw)
}

/// Load the policy from `policy_path()`, falling back to defaults when the
/// file is absent or invalid.
pub fn load_policy_or_default() -> AdherencePolicy {
    let Some(path) = policy_path() else {
        tracing::debug!("No config directory; using default adherence policy");
        return AdherencePolicy::default();
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Policy file absent; using defaults");
        return AdherencePolicy::default();
    }
    match load_policy(&path) {
        Ok(policy) => {
            tracing::info!(path = %path.display(), "Loaded adherence policy");
            policy
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Invalid adherence policy; using defaults");
            AdherencePolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn app_data_dir_ends_with_app_folder() {
        if let Some(dir) = app_data_dir() {
            assert!(dir.ends_with("dosewise"));
        }
    }

    #[test]
    fn app_name_is_dosewise() {
        assert_eq!(APP_NAME, "Dosewise");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_policy_uses_standard_thresholds() {
        let policy = AdherencePolicy::default();
        assert_eq!(policy.completion_threshold, 90);
        assert_eq!(policy.good_threshold, 90);
        assert_eq!(policy.warning_threshold, 75);
        assert_eq!(policy.pending_source, PendingSource::Reported);
        assert_eq!(policy.day_counting, DayCounting::QualifyingWeekdays);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let policy =
            AdherencePolicy::from_json_str(r#"{"goodThreshold": 95, "pendingSource": "derived"}"#)
                .unwrap();
        assert_eq!(policy.good_threshold, 95);
        assert_eq!(policy.warning_threshold, 75);
        assert_eq!(policy.pending_source, PendingSource::Derived);
    }

    #[test]
    fn threshold_above_100_rejected() {
        let err = AdherencePolicy::from_json_str(r#"{"completionThreshold": 120}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ThresholdOutOfRange { name: "completionThreshold", value: 120 }
        ));
    }

    #[test]
    fn warning_above_good_rejected() {
        let err = AdherencePolicy::from_json_str(r#"{"goodThreshold": 70, "warningThreshold": 80}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdOrder { warning: 80, good: 70 }));
    }

    #[test]
    fn malformed_json_rejected() {
        let err = AdherencePolicy::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_policy_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dayCounting": "calendar_days", "warningThreshold": 60}}"#).unwrap();

        let policy = load_policy(file.path()).unwrap();
        assert_eq!(policy.day_counting, DayCounting::CalendarDays);
        assert_eq!(policy.warning_threshold, 60);
    }

    // The only test touching POLICY_ENV_VAR; phases run in order.
    #[test]
    fn env_override_drives_policy_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::env::set_var(POLICY_ENV_VAR, &path);
        assert_eq!(policy_path(), Some(path.clone()));

        // Absent file
        assert_eq!(load_policy_or_default(), AdherencePolicy::default());

        // Valid file
        std::fs::write(&path, r#"{"goodThreshold": 95, "pendingSource": "derived"}"#).unwrap();
        let policy = load_policy_or_default();
        assert_eq!(policy.good_threshold, 95);
        assert_eq!(policy.pending_source, PendingSource::Derived);

        // Invalid file falls back
        std::fs::write(&path, r#"{"warningThreshold": 99}"#).unwrap();
        assert_eq!(load_policy_or_default(), AdherencePolicy::default());
        std::fs::write(&path, "{broken").unwrap();
        assert_eq!(load_policy_or_default(), AdherencePolicy::default());

        std::env::remove_var(POLICY_ENV_VAR);
    }

    #[test]
    fn load_policy_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_policy(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
