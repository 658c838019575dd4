use serde::Serialize;

use super::{degrade, DashboardCell, DashboardSection};
use crate::core_state::{CoreError, CoreState};
use crate::models::{Doctor, Profile, Surgery};
use crate::notice::Notice;
use crate::registration::{register_doctor, DoctorForm, DOCTOR_ADDED_NOTICE};
use crate::scheduling::{schedule_surgery, SurgeryForm, SCHEDULED_NOTICE};
use crate::store::{select_as, Query, RecordStore, Table};

use super::patient::active_doctors_query;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminDashboard {
    pub doctors: Vec<Doctor>,
    pub patients: Vec<Profile>,
    pub surgeries: Vec<Surgery>,
    pub failed: Vec<DashboardSection>,
}

pub fn patients_query() -> Query {
    Query::select(Table::Profiles).eq("role", "patient")
}

pub fn all_surgeries_query() -> Query {
    Query::select(Table::Surgeries)
        .embed(Table::Doctors, &["name"])
        .embed(Table::Profiles, &["full_name", "email"])
        .order_asc("surgery_date")
}

/// Build the admin dashboard. Failed sections are logged and left empty;
/// the admin screen shows no toast for them.
pub fn assemble_admin_dashboard(store: &dyn RecordStore, bearer: Option<&str>) -> AdminDashboard {
    let mut failed = Vec::new();

    let (doctors, err) = degrade(
        DashboardSection::Doctors,
        select_as(store, &active_doctors_query(), bearer),
    );
    failed.extend(err.map(|_| DashboardSection::Doctors));

    let (patients, err) = degrade(
        DashboardSection::Patients,
        select_as(store, &patients_query(), bearer),
    );
    failed.extend(err.map(|_| DashboardSection::Patients));

    let (surgeries, err) = degrade(
        DashboardSection::Surgeries,
        select_as(store, &all_surgeries_query(), bearer),
    );
    failed.extend(err.map(|_| DashboardSection::Surgeries));

    AdminDashboard {
        doctors,
        patients,
        surgeries,
        failed,
    }
}

/// Admin dashboard state owned by the `/admin` screen.
pub struct AdminDashboardView {
    state: CoreState,
    cell: DashboardCell<AdminDashboard>,
}

impl AdminDashboardView {
    pub fn new(state: CoreState) -> Self {
        Self {
            state,
            cell: DashboardCell::new(),
        }
    }

    pub fn refresh(&self) -> Result<AdminDashboard, CoreError> {
        let bearer = self.state.bearer()?;
        self.cell
            .load_with(|| assemble_admin_dashboard(self.state.store(), bearer.as_deref()))
    }

    pub fn snapshot(&self) -> Result<AdminDashboard, CoreError> {
        self.cell.snapshot()
    }

    pub fn is_loading(&self) -> Result<bool, CoreError> {
        self.cell.is_loading()
    }

    /// Submit the scheduling form. On success the form is cleared and the
    /// list reloaded.
    pub fn schedule_surgery(&self, form: &mut SurgeryForm) -> Result<Notice, CoreError> {
        match schedule_surgery(&self.state, form) {
            Ok(_) => {
                form.clear();
                self.refresh()?;
                Ok(Notice::success(SCHEDULED_NOTICE))
            }
            Err(e) => Ok(e.to_notice()),
        }
    }

    /// Submit the doctor registration form.
    pub fn register_doctor(&self, form: &mut DoctorForm) -> Result<Notice, CoreError> {
        match register_doctor(&self.state, form) {
            Ok(_) => {
                form.clear();
                self.refresh()?;
                Ok(Notice::success(DOCTOR_ADDED_NOTICE))
            }
            Err(e) => Ok(e.to_notice()),
        }
    }
}
