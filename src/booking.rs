//! Patient appointment booking.

use chrono::{DateTime, FixedOffset, Utc};

use crate::core_state::{CoreError, CoreState};
use crate::datetime::parse_date_input;
use crate::models::{AppointmentStatus, Doctor, NewAppointment};
use crate::notice::Notice;
use crate::store::{insert_one, StoreError, Table};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Please log in to book an appointment.")]
    NotSignedIn,
    /// Empty or dismissed input. Not shown to the user.
    #[error("Booking cancelled")]
    Cancelled,
    #[error("Invalid date format. Please use YYYY-MM-DD.")]
    InvalidDate,
    #[error("Error booking: {0}")]
    Store(#[from] StoreError),
    #[error("Error booking: {0}")]
    Session(#[from] CoreError),
}

impl BookingError {
    /// Local rejection, no network call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::NotSignedIn | Self::Cancelled | Self::InvalidDate)
    }

    /// Toast for this failure. Cancellation is silent.
    pub fn to_notice(&self) -> Option<Notice> {
        match self {
            Self::Cancelled => None,
            other => Some(Notice::error(other.to_string())),
        }
    }
}

/// Inputs collected when a patient books a doctor. `None` means the prompt
/// was dismissed.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub doctor: Doctor,
    pub date: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    pub appointment: NewAppointment,
    pub notice: Notice,
}

/// Only a dismissed prompt or an empty string counts as not provided.
fn provided(input: &Option<String>) -> Option<&str> {
    input.as_deref().filter(|s| !s.is_empty())
}

/// Check the prompt answers before anything reaches the network. Returns
/// the requested instant and the reason exactly as typed.
pub fn check_inputs(
    date: &Option<String>,
    reason: &Option<String>,
    local_offset: FixedOffset,
) -> Result<(DateTime<Utc>, String), BookingError> {
    let (Some(date), Some(reason)) = (provided(date), provided(reason)) else {
        return Err(BookingError::Cancelled);
    };
    let requested_date =
        parse_date_input(date, local_offset).ok_or(BookingError::InvalidDate)?;
    Ok((requested_date, reason.to_string()))
}

/// Request an appointment for the signed-in patient.
///
/// Inserts exactly one pending row. Duplicates and past dates are allowed.
/// Cancelled or malformed input is rejected before the session is looked up.
pub fn book_appointment(
    state: &CoreState,
    request: &BookingRequest,
) -> Result<BookingReceipt, BookingError> {
    let (requested_date, reason) =
        check_inputs(&request.date, &request.reason, state.config.utc_offset)?;
    let session = state.session()?.ok_or(BookingError::NotSignedIn)?;
    let appointment = NewAppointment {
        patient_id: session.user_id(),
        doctor_id: request.doctor.id,
        requested_date,
        reason,
        status: AppointmentStatus::Pending,
    };

    insert_one(
        state.store(),
        Table::Appointments,
        &appointment,
        Some(&session.access_token),
    )
    .inspect_err(|e| tracing::warn!(error = %e, "appointment insert rejected"))?;

    tracing::info!(
        patient_id = %appointment.patient_id,
        doctor_id = %appointment.doctor_id,
        "appointment requested"
    );
    Ok(BookingReceipt {
        notice: Notice::success(format!(
            "Appointment requested with Dr. {}",
            request.doctor.name
        )),
        appointment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_state::test_support::*;
    use crate::notice::NoticeLevel;
    use serde_json::json;
    use uuid::Uuid;

    fn doctor() -> Doctor {
        Doctor {
            id: Uuid::new_v4(),
            name: "Kwame Mensah".into(),
            specialization: Some("Cardiology".into()),
            contact_info: None,
            is_active: true,
        }
    }

    fn request(date: Option<&str>, reason: Option<&str>) -> BookingRequest {
        BookingRequest {
            doctor: doctor(),
            date: date.map(String::from),
            reason: reason.map(String::from),
        }
    }

    #[test]
    fn empty_or_cancelled_inputs_insert_nothing() {
        let fx = signed_in(Uuid::new_v4());
        let cases = [
            (None, Some("Chest pain")),
            (Some(""), Some("Chest pain")),
            (Some("2026-11-02"), None),
            (Some("2026-11-02"), Some("")),
            (None, None),
        ];
        for (date, reason) in cases {
            let err = book_appointment(&fx.state, &request(date, reason)).unwrap_err();
            assert!(matches!(err, BookingError::Cancelled));
            assert_eq!(err.to_notice(), None);
        }
        assert_eq!(fx.store.insert_count(Table::Appointments), 0);
    }

    #[test]
    fn unparseable_date_rejected_without_insert() {
        let fx = signed_in(Uuid::new_v4());
        for date in ["next tuesday", "02/11/2026", "2026-02-31", "   "] {
            let err = book_appointment(&fx.state, &request(Some(date), Some("Checkup"))).unwrap_err();
            assert!(err.is_validation());
            assert_eq!(
                err.to_notice(),
                Some(Notice::error("Invalid date format. Please use YYYY-MM-DD."))
            );
        }
        assert_eq!(fx.store.insert_count(Table::Appointments), 0);
    }

    #[test]
    fn signed_out_user_is_asked_to_log_in() {
        let fx = signed_out();
        let err = book_appointment(&fx.state, &request(Some("2026-11-02"), Some("Checkup")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Please log in to book an appointment.");
        assert_eq!(fx.store.insert_count(Table::Appointments), 0);
    }

    #[test]
    fn whitespace_reason_is_kept_as_typed() {
        let fx = signed_in(Uuid::new_v4());
        book_appointment(&fx.state, &request(Some("2026-11-02"), Some("   "))).unwrap();
        let rows = fx.store.rows(Table::Appointments);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["reason"], json!("   "));
    }

    #[test]
    fn local_rejections_never_look_up_the_session() {
        let fx = signed_out();
        let cancelled = book_appointment(&fx.state, &request(None, Some("Checkup"))).unwrap_err();
        assert!(matches!(cancelled, BookingError::Cancelled));
        let bad_date =
            book_appointment(&fx.state, &request(Some("soon"), Some("Checkup"))).unwrap_err();
        assert!(matches!(bad_date, BookingError::InvalidDate));
        assert_eq!(fx.auth.session_lookups(), 0);

        let err = book_appointment(&fx.state, &request(Some("2026-11-02"), Some("Checkup")))
            .unwrap_err();
        assert!(matches!(err, BookingError::NotSignedIn));
        assert_eq!(fx.auth.session_lookups(), 1);
    }

    #[test]
    fn inserted_row_is_pending_for_session_user() {
        let user = Uuid::new_v4();
        let fx = signed_in(user);
        let req = request(Some("2026-11-02"), Some("  Chest pain  "));
        let receipt = book_appointment(&fx.state, &req).unwrap();

        assert_eq!(receipt.notice.level, NoticeLevel::Success);
        assert_eq!(receipt.notice.message, "Appointment requested with Dr. Kwame Mensah");

        let rows = fx.store.rows(Table::Appointments);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], json!("Pending"));
        assert_eq!(rows[0]["patient_id"], json!(user));
        assert_eq!(rows[0]["doctor_id"], json!(req.doctor.id));
        assert_eq!(rows[0]["reason"], json!("  Chest pain  "));
        assert_eq!(rows[0]["requested_date"], json!("2026-11-02T00:00:00Z"));
        assert!(fx.store.last_bearer().unwrap().starts_with("mock-access-"));
    }

    #[test]
    fn duplicates_and_past_dates_are_accepted() {
        let fx = signed_in(Uuid::new_v4());
        let req = request(Some("2001-01-01"), Some("Follow-up"));
        book_appointment(&fx.state, &req).unwrap();
        book_appointment(&fx.state, &req).unwrap();
        assert_eq!(fx.store.rows(Table::Appointments).len(), 2);
    }

    #[test]
    fn store_failure_is_passed_through() {
        let fx = signed_in(Uuid::new_v4());
        fx.store.fail_inserts(
            Table::Appointments,
            StoreError::Rejected {
                status: 403,
                message: "new row violates row-level security policy".into(),
            },
        );
        let err = book_appointment(&fx.state, &request(Some("2026-11-02"), Some("Checkup")))
            .unwrap_err();
        assert!(!err.is_validation());
        assert_eq!(
            err.to_notice(),
            Some(Notice::error(
                "Error booking: new row violates row-level security policy"
            ))
        );
    }
}
