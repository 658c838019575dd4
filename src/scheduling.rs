//! Admin OT surgery scheduling.

use chrono::FixedOffset;
use uuid::Uuid;

use crate::core_state::{CoreError, CoreState};
use crate::datetime::parse_date_input;
use crate::models::{NewSurgery, SurgeryStatus};
use crate::notice::Notice;
use crate::store::{insert_one, StoreError, Table};

pub const SCHEDULED_NOTICE: &str = "Surgery Scheduled Successfully";

/// Admin "schedule surgery" form. Patient, doctor and date are required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurgeryForm {
    pub patient_id: String,
    pub doctor_id: String,
    pub surgery_type: String,
    pub ot_id: String,
    /// `datetime-local` value, e.g. `2026-11-02T09:30`.
    pub surgery_date: String,
    pub pre_op_events: String,
}

impl SurgeryForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Please fill required schedule fields")]
    MissingFields,
    #[error("Invalid {0} selection")]
    InvalidId(&'static str),
    #[error("Invalid surgery date")]
    InvalidDate,
    #[error("Error scheduling: {0}")]
    Store(#[from] StoreError),
    #[error("Error scheduling: {0}")]
    Session(#[from] CoreError),
}

impl SchedulingError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingFields | Self::InvalidId(_) | Self::InvalidDate
        )
    }

    pub fn to_notice(&self) -> Notice {
        Notice::error(self.to_string())
    }
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_id(value: &str, field: &'static str) -> Result<Uuid, SchedulingError> {
    Uuid::parse_str(value.trim()).map_err(|_| SchedulingError::InvalidId(field))
}

/// Validate the form and build the row to insert.
pub fn build_surgery(
    form: &SurgeryForm,
    local_offset: FixedOffset,
) -> Result<NewSurgery, SchedulingError> {
    if [&form.patient_id, &form.doctor_id, &form.surgery_date]
        .iter()
        .any(|v| v.trim().is_empty())
    {
        return Err(SchedulingError::MissingFields);
    }

    Ok(NewSurgery {
        patient_id: parse_id(&form.patient_id, "patient")?,
        doctor_id: parse_id(&form.doctor_id, "doctor")?,
        surgery_type: optional_text(&form.surgery_type),
        ot_id: optional_text(&form.ot_id),
        surgery_date: parse_date_input(&form.surgery_date, local_offset)
            .ok_or(SchedulingError::InvalidDate)?,
        pre_op_events: optional_text(&form.pre_op_events),
        status: SurgeryStatus::Scheduled,
    })
}

/// Insert one scheduled surgery. No overlap or capacity check is made.
pub fn schedule_surgery(
    state: &CoreState,
    form: &SurgeryForm,
) -> Result<NewSurgery, SchedulingError> {
    let surgery = build_surgery(form, state.config.utc_offset)?;
    let bearer = state.bearer()?;

    insert_one(state.store(), Table::Surgeries, &surgery, bearer.as_deref())
        .inspect_err(|e| tracing::warn!(error = %e, "surgery insert rejected"))?;

    tracing::info!(
        patient_id = %surgery.patient_id,
        doctor_id = %surgery.doctor_id,
        ot_id = surgery.ot_id.as_deref().unwrap_or_default(),
        "surgery scheduled"
    );
    Ok(surgery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_state::test_support::*;
    use serde_json::{json, Value};

    fn form() -> SurgeryForm {
        SurgeryForm {
            patient_id: Uuid::new_v4().to_string(),
            doctor_id: Uuid::new_v4().to_string(),
            surgery_type: "Appendectomy".into(),
            ot_id: "OT-3".into(),
            surgery_date: "2026-11-02T09:30".into(),
            pre_op_events: "".into(),
        }
    }

    #[test]
    fn missing_required_fields_insert_nothing() {
        let fx = signed_in(Uuid::new_v4());
        let mut cases = Vec::new();
        let mut f = form();
        f.patient_id.clear();
        cases.push(f);
        let mut f = form();
        f.doctor_id = "  ".into();
        cases.push(f);
        let mut f = form();
        f.surgery_date.clear();
        cases.push(f);

        for f in cases {
            let err = schedule_surgery(&fx.state, &f).unwrap_err();
            assert_eq!(err.to_string(), "Please fill required schedule fields");
        }
        assert_eq!(fx.store.insert_count(Table::Surgeries), 0);
    }

    #[test]
    fn optional_fields_may_be_blank() {
        let mut f = form();
        f.surgery_type.clear();
        f.ot_id.clear();
        let surgery = build_surgery(&f, FixedOffset::east_opt(0).unwrap()).unwrap();
        assert_eq!(surgery.surgery_type, None);
        assert_eq!(surgery.ot_id, None);
        assert_eq!(surgery.pre_op_events, None);
    }

    #[test]
    fn malformed_input_rejected_before_insert() {
        let fx = signed_in(Uuid::new_v4());
        let mut f = form();
        f.doctor_id = "dr-7".into();
        assert!(matches!(
            schedule_surgery(&fx.state, &f),
            Err(SchedulingError::InvalidId("doctor"))
        ));
        let mut f = form();
        f.surgery_date = "soon".into();
        assert!(matches!(
            schedule_surgery(&fx.state, &f),
            Err(SchedulingError::InvalidDate)
        ));
        assert_eq!(fx.store.insert_count(Table::Surgeries), 0);
    }

    #[test]
    fn inserted_surgery_is_scheduled() {
        let fx = signed_in(Uuid::new_v4());
        let f = form();
        let surgery = schedule_surgery(&fx.state, &f).unwrap();
        assert_eq!(surgery.status, SurgeryStatus::Scheduled);

        let rows = fx.store.rows(Table::Surgeries);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], json!("Scheduled"));
        assert_eq!(rows[0]["patient_id"], json!(f.patient_id));
        assert_eq!(rows[0]["surgery_date"], json!("2026-11-02T09:30:00Z"));
        assert_eq!(rows[0]["pre_op_events"], Value::Null);
    }

    #[test]
    fn datetime_uses_client_offset() {
        let lagos = FixedOffset::east_opt(3600).unwrap();
        let surgery = build_surgery(&form(), lagos).unwrap();
        assert_eq!(surgery.surgery_date.to_rfc3339(), "2026-11-02T08:30:00+00:00");
    }

    #[test]
    fn store_failure_is_prefixed() {
        let fx = signed_in(Uuid::new_v4());
        fx.store.fail_inserts(
            Table::Surgeries,
            StoreError::Rejected {
                status: 409,
                message: "insert or update on table \"surgeries\" violates foreign key constraint".into(),
            },
        );
        let err = schedule_surgery(&fx.state, &form()).unwrap_err();
        assert!(!err.is_validation());
        assert_eq!(
            err.to_notice().message,
            "Error scheduling: insert or update on table \"surgeries\" violates foreign key constraint"
        );
    }

    #[test]
    fn clear_resets_every_field() {
        let mut f = form();
        f.clear();
        assert_eq!(f, SurgeryForm::default());
    }
}
