use serde::{Deserialize, Serialize};

/// Raised when a stored string does not name any variant of a `str_enum!` type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(DoseStatus {
    Pending => "pending",
    Taken => "taken",
    Missed => "missed",
});

str_enum!(ColorBand {
    Good => "good",
    Warning => "warning",
    Critical => "critical",
});

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
});

str_enum!(StatusFilter {
    All => "all",
    Taken => "taken",
    Missed => "missed",
    Pending => "pending",
});

impl DoseStatus {
    /// Case-insensitive match against the backend's text representation.
    /// Surrounding whitespace is ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        [Self::Pending, Self::Taken, Self::Missed]
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(trimmed))
    }

    /// Backend integer encoding: 0 = Pending, 1 = Taken, 2 = Missed.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Taken),
            2 => Some(Self::Missed),
            _ => None,
        }
    }
}

impl StatusFilter {
    pub fn matches(self, status: DoseStatus) -> bool {
        match self {
            Self::All => true,
            Self::Taken => status == DoseStatus::Taken,
            Self::Missed => status == DoseStatus::Missed,
            Self::Pending => status == DoseStatus::Pending,
        }
    }
}

/// Lifecycle label of a prescription as shown on summary screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrescriptionStatus {
    #[serde(rename = "Ongoing")]
    Ongoing,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Completed but Missed Some Doses")]
    CompletedWithMissedDoses,
}

impl PrescriptionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ongoing => "Ongoing",
            Self::Completed => "Completed",
            Self::CompletedWithMissedDoses => "Completed but Missed Some Doses",
        }
    }
}

impl std::fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
