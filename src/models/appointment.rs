use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::doctor::DoctorSummary;
use super::enums::AppointmentStatus;
use super::profile::non_blank;

pub const NO_REASON: &str = "No reason provided";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub requested_date: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default, rename = "doctors")]
    pub doctor: Option<DoctorSummary>,
}

impl Appointment {
    pub fn doctor_name(&self) -> &str {
        DoctorSummary::display_name(self.doctor.as_ref())
    }

    pub fn reason_text(&self) -> &str {
        non_blank(&self.reason).unwrap_or(NO_REASON)
    }
}

/// Insert payload for the patient booking flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub requested_date: DateTime<Utc>,
    pub reason: String,
    pub status: AppointmentStatus,
}
