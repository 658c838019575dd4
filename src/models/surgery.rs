use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::doctor::DoctorSummary;
use super::enums::SurgeryStatus;
use super::profile::{non_blank, PatientSummary};

/// Label shown where the patient behind a surgery is not known to the viewer.
pub const PRIVATE_PATIENT: &str = "Private";

/// Surgery row, optionally carrying its `doctors` / `profiles` expansions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surgery {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    #[serde(default)]
    pub surgery_type: Option<String>,
    #[serde(default)]
    pub ot_id: Option<String>,
    pub surgery_date: DateTime<Utc>,
    #[serde(default)]
    pub pre_op_events: Option<String>,
    pub status: SurgeryStatus,
    #[serde(default, rename = "doctors")]
    pub doctor: Option<DoctorSummary>,
    #[serde(default, rename = "profiles")]
    pub patient: Option<PatientSummary>,
}

impl Surgery {
    pub fn doctor_name(&self) -> &str {
        DoctorSummary::display_name(self.doctor.as_ref())
    }

    pub fn patient_name(&self) -> &str {
        self.patient
            .as_ref()
            .and_then(|p| non_blank(&p.full_name))
            .unwrap_or(PRIVATE_PATIENT)
    }
}

/// Insert payload for the admin scheduling flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSurgery {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub surgery_type: Option<String>,
    pub ot_id: Option<String>,
    pub surgery_date: DateTime<Utc>,
    pub pre_op_events: Option<String>,
    pub status: SurgeryStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_expanded_row() {
        let row = json!({
            "id": Uuid::new_v4(),
            "patient_id": Uuid::new_v4(),
            "doctor_id": Uuid::new_v4(),
            "surgery_type": "Appendectomy",
            "ot_id": "OT-04",
            "surgery_date": "2026-11-02T08:30:00+00:00",
            "pre_op_events": "Fasting from midnight",
            "status": "Scheduled",
            "doctors": { "name": "Sarah Smith" },
            "profiles": { "full_name": "Ada Obi", "email": "ada@example.com" }
        });
        let surgery: Surgery = serde_json::from_value(row).unwrap();
        assert_eq!(surgery.doctor_name(), "Sarah Smith");
        assert_eq!(surgery.patient_name(), "Ada Obi");
        assert_eq!(surgery.status, SurgeryStatus::Scheduled);
    }

    #[test]
    fn missing_expansions_use_placeholders() {
        let row = json!({
            "id": Uuid::new_v4(),
            "patient_id": Uuid::new_v4(),
            "doctor_id": Uuid::new_v4(),
            "surgery_date": "2026-11-02T08:30:00Z",
            "status": "Completed",
            "doctors": null
        });
        let surgery: Surgery = serde_json::from_value(row).unwrap();
        assert_eq!(surgery.doctor_name(), "Unassigned");
        assert_eq!(surgery.patient_name(), PRIVATE_PATIENT);
    }

    #[test]
    fn new_surgery_serializes_store_columns() {
        let payload = NewSurgery {
            patient_id: Uuid::nil(),
            doctor_id: Uuid::nil(),
            surgery_type: None,
            ot_id: Some("OT-01".into()),
            surgery_date: "2026-11-02T08:30:00Z".parse().unwrap(),
            pre_op_events: None,
            status: SurgeryStatus::Scheduled,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["status"], "Scheduled");
        assert_eq!(value["ot_id"], "OT-01");
        assert!(value["surgery_type"].is_null());
        assert_eq!(value["surgery_date"], "2026-11-02T08:30:00Z");
    }
}
