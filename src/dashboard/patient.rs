use serde::Serialize;
use uuid::Uuid;

use super::{degrade, push_notice, DashboardCell, DashboardSection};
use crate::booking::{book_appointment, BookingRequest};
use crate::core_state::{CoreError, CoreState};
use crate::models::{Appointment, Doctor, Surgery};
use crate::notice::Notice;
use crate::store::{select_as, Query, RecordStore, Table};

const DOCTOR_SUMMARY: &[&str] = &["name", "specialization"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatientDashboard {
    pub user_id: Option<Uuid>,
    pub doctors: Vec<Doctor>,
    pub schedule: Vec<Surgery>,
    pub my_surgeries: Vec<Surgery>,
    pub appointments: Vec<Appointment>,
    /// Sections that failed to load this time.
    pub failed: Vec<DashboardSection>,
    pub notices: Vec<Notice>,
}

// ─────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────

pub fn active_doctors_query() -> Query {
    Query::select(Table::Doctors).eq("is_active", true)
}

pub fn schedule_query() -> Query {
    Query::select(Table::Surgeries)
        .embed(Table::Doctors, DOCTOR_SUMMARY)
        .embed(Table::Profiles, &["full_name", "email"])
        .order_asc("surgery_date")
}

pub fn my_surgeries_query(user_id: Uuid) -> Query {
    Query::select(Table::Surgeries)
        .embed(Table::Doctors, DOCTOR_SUMMARY)
        .eq("patient_id", user_id)
        .order_asc("surgery_date")
}

pub fn my_appointments_query(user_id: Uuid) -> Query {
    Query::select(Table::Appointments)
        .embed(Table::Doctors, DOCTOR_SUMMARY)
        .eq("patient_id", user_id)
        .order_asc("requested_date")
}

// ─────────────────────────────────────────────
// Assembly
// ─────────────────────────────────────────────

/// Build the patient dashboard. Every section loads on its own; a failed
/// one is left empty and reported through `notices`.
pub fn assemble_patient_dashboard(
    store: &dyn RecordStore,
    user_id: Option<Uuid>,
    bearer: Option<&str>,
) -> PatientDashboard {
    let mut view = PatientDashboard {
        user_id,
        ..PatientDashboard::default()
    };
    let mut record = |section: DashboardSection, failure: Option<_>| {
        if failure.is_some() {
            view.failed.push(section);
            push_notice(&mut view.notices, Notice::error(section.failure_message()));
        }
    };

    let (doctors, err) = degrade(
        DashboardSection::Doctors,
        select_as(store, &active_doctors_query(), bearer),
    );
    record(DashboardSection::Doctors, err);

    let (schedule, err) = degrade(
        DashboardSection::Schedule,
        select_as(store, &schedule_query(), bearer),
    );
    record(DashboardSection::Schedule, err);

    let (my_surgeries, appointments) = match user_id {
        Some(user) => {
            let (surgeries, err) = degrade(
                DashboardSection::MySurgeries,
                select_as(store, &my_surgeries_query(user), bearer),
            );
            record(DashboardSection::MySurgeries, err);

            let (appointments, err) = degrade(
                DashboardSection::Appointments,
                select_as(store, &my_appointments_query(user), bearer),
            );
            record(DashboardSection::Appointments, err);
            (surgeries, appointments)
        }
        None => (Vec::new(), Vec::new()),
    };

    view.doctors = doctors;
    view.schedule = schedule;
    view.my_surgeries = my_surgeries;
    view.appointments = appointments;
    view
}

// ─────────────────────────────────────────────
// View
// ─────────────────────────────────────────────

/// Patient dashboard state owned by the `/dashboard` screen.
pub struct PatientDashboardView {
    state: CoreState,
    cell: DashboardCell<PatientDashboard>,
}

impl PatientDashboardView {
    pub fn new(state: CoreState) -> Self {
        Self {
            state,
            cell: DashboardCell::new(),
        }
    }

    /// Re-run every query for the current user.
    pub fn refresh(&self) -> Result<PatientDashboard, CoreError> {
        let session = self.state.session()?;
        let user_id = session.as_ref().map(|s| s.user_id());
        let bearer = session.as_ref().map(|s| s.access_token.as_str());
        self.cell
            .load_with(|| assemble_patient_dashboard(self.state.store(), user_id, bearer))
    }

    pub fn snapshot(&self) -> Result<PatientDashboard, CoreError> {
        self.cell.snapshot()
    }

    pub fn is_loading(&self) -> Result<bool, CoreError> {
        self.cell.is_loading()
    }

    /// Book `request` and reload on success. Returns the toast to show, if
    /// any.
    pub fn book(&self, request: &BookingRequest) -> Result<Option<Notice>, CoreError> {
        match book_appointment(&self.state, request) {
            Ok(receipt) => {
                self.refresh()?;
                Ok(Some(receipt.notice))
            }
            Err(e) => Ok(e.to_notice()),
        }
    }
}
