use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The serde representation is the same string as `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ValidationError::InvalidEnum {
                        field: stringify!($name),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(TriageLevel {
    Critical => "critical",
    Urgent => "urgent",
    SemiUrgent => "semi_urgent",
    NonUrgent => "non_urgent",
    Routine => "routine",
});

impl TriageLevel {
    /// Expected time to medical attention for this tier.
    pub fn response_window(&self) -> &'static str {
        match self {
            Self::Critical => "immediate",
            Self::Urgent => "15-30 minutes",
            Self::SemiUrgent => "1-2 hours",
            Self::NonUrgent => "2-4 hours",
            Self::Routine => "schedule an appointment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Urgent => "Urgent",
            Self::SemiUrgent => "Semi-urgent",
            Self::NonUrgent => "Non-urgent",
            Self::Routine => "Routine",
        }
    }

    /// 1 = most urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 1,
            Self::Urgent => 2,
            Self::SemiUrgent => 3,
            Self::NonUrgent => 4,
            Self::Routine => 5,
        }
    }
}

str_enum!(BloodType {
    APositive => "A+",
    ANegative => "A-",
    BPositive => "B+",
    BNegative => "B-",
    AbPositive => "AB+",
    AbNegative => "AB-",
    OPositive => "O+",
    ONegative => "O-",
});

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

str_enum!(ConsultationStatus {
    Pending => "pending",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
});
