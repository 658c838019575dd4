use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::non_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// Insert payload for the admin registration flow. `is_active` is left to
/// the table default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDoctor {
    pub name: String,
    pub specialization: String,
    pub contact_info: Option<String>,
}

/// `doctors(name[, specialization])` relation expansion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
}

pub const UNASSIGNED_DOCTOR: &str = "Unassigned";

impl DoctorSummary {
    pub fn display_name(summary: Option<&DoctorSummary>) -> &str {
        summary
            .and_then(|d| non_blank(&d.name))
            .unwrap_or(UNASSIGNED_DOCTOR)
    }
}
