use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Macro to generate an open string enum: known variants map to fixed
/// strings, anything else is kept verbatim in `Other`.
///
/// Status transitions happen outside this client, so values the store sends
/// back must never be rejected.
macro_rules! open_str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $s,)+
                    Self::Other(value) => value.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($s => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::from(raw.as_str()))
            }
        }
    };
}

open_str_enum!(Role {
    Patient => "patient",
});

open_str_enum!(SurgeryStatus {
    Scheduled => "Scheduled",
    Completed => "Completed",
});

open_str_enum!(AppointmentStatus {
    Pending => "Pending",
});

/// How a surgery status is presented. Unknown values read as cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurgeryBadge {
    Scheduled,
    Completed,
    Cancelled,
}

/// How an appointment status is presented. Anything but pending reads as approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentBadge {
    Pending,
    Approved,
}

impl SurgeryStatus {
    pub fn badge(&self) -> SurgeryBadge {
        match self {
            Self::Scheduled => SurgeryBadge::Scheduled,
            Self::Completed => SurgeryBadge::Completed,
            Self::Other(_) => SurgeryBadge::Cancelled,
        }
    }
}

impl AppointmentStatus {
    pub fn badge(&self) -> AppointmentBadge {
        match self {
            Self::Pending => AppointmentBadge::Pending,
            Self::Other(_) => AppointmentBadge::Approved,
        }
    }
}

impl Role {
    pub fn is_patient(&self) -> bool {
        matches!(self, Self::Patient)
    }
}
