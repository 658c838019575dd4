//! Admin doctor registration.

use crate::core_state::{CoreError, CoreState};
use crate::models::NewDoctor;
use crate::notice::Notice;
use crate::store::{insert_one, StoreError, Table};

pub const DOCTOR_ADDED_NOTICE: &str = "Doctor added successfully";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorForm {
    pub name: String,
    pub specialization: String,
    pub contact_info: String,
}

impl DoctorForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn to_new_doctor(&self) -> Result<NewDoctor, RegistrationError> {
        let name = self.name.trim();
        let specialization = self.specialization.trim();
        if name.is_empty() || specialization.is_empty() {
            return Err(RegistrationError::MissingFields);
        }
        let contact = self.contact_info.trim();
        Ok(NewDoctor {
            name: name.to_string(),
            specialization: specialization.to_string(),
            contact_info: (!contact.is_empty()).then(|| contact.to_string()),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Please fill all doctor fields")]
    MissingFields,
    /// Store message, shown as is.
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Session(#[from] CoreError),
}

impl RegistrationError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingFields)
    }

    pub fn to_notice(&self) -> Notice {
        Notice::error(self.to_string())
    }
}

/// Add a doctor to the registry. The store decides the active flag.
pub fn register_doctor(state: &CoreState, form: &DoctorForm) -> Result<NewDoctor, RegistrationError> {
    let doctor = form.to_new_doctor()?;
    let bearer = state.bearer()?;
    insert_one(state.store(), Table::Doctors, &doctor, bearer.as_deref())
        .inspect_err(|e| tracing::warn!(error = %e, "doctor insert rejected"))?;
    tracing::info!(specialization = %doctor.specialization, "doctor registered");
    Ok(doctor)
}
