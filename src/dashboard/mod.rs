//! View-model assembly for the patient and admin dashboards.
//!
//! Each dashboard owns a `DashboardCell`. Loads are ticketed: the loading
//! flag stays up while any load is in flight, and a finished load replaces
//! the view only if no newer load has already been applied.

pub mod admin;
pub mod patient;

pub use admin::*;
pub use patient::*;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::core_state::CoreError;
use crate::notice::Notice;
use crate::store::StoreError;

pub const DASHBOARD_LOAD_FAILED: &str = "Failed to load dashboard data.";
pub const APPOINTMENTS_LOAD_FAILED: &str = "Failed to load your appointments.";

// ═══════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════

/// Independently loaded part of a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardSection {
    Doctors,
    Schedule,
    MySurgeries,
    Appointments,
    Patients,
    Surgeries,
}

impl DashboardSection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Doctors => "doctors",
            Self::Schedule => "schedule",
            Self::MySurgeries => "my_surgeries",
            Self::Appointments => "appointments",
            Self::Patients => "patients",
            Self::Surgeries => "surgeries",
        }
    }

    /// Notice shown on the patient dashboard when this section fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Appointments => APPOINTMENTS_LOAD_FAILED,
            _ => DASHBOARD_LOAD_FAILED,
        }
    }
}

/// Degrade a failed section to empty, logging the cause. Returns the
/// failure so callers can decide whether to surface it.
pub(crate) fn degrade<T>(
    section: DashboardSection,
    result: Result<Vec<T>, StoreError>,
) -> (Vec<T>, Option<StoreError>) {
    match result {
        Ok(rows) => (rows, None),
        Err(e) => {
            tracing::warn!(section = section.as_str(), error = %e, "dashboard section failed");
            (Vec::new(), Some(e))
        }
    }
}

/// Add `notice` unless an identical one is already queued.
pub(crate) fn push_notice(notices: &mut Vec<Notice>, notice: Notice) {
    if !notices.contains(&notice) {
        notices.push(notice);
    }
}

// ═══════════════════════════════════════════════════════════
// Load tracking
// ═══════════════════════════════════════════════════════════

/// Issued when a load starts; hand it back with the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct LoadTracker {
    issued: u64,
    applied: u64,
    in_flight: usize,
}

impl LoadTracker {
    pub fn issue(&mut self) -> LoadTicket {
        self.issued += 1;
        self.in_flight += 1;
        LoadTicket(self.issued)
    }

    /// Close `ticket`. True when its result should be applied.
    pub fn settle(&mut self, ticket: LoadTicket) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        if ticket.0 > self.applied {
            self.applied = ticket.0;
            true
        } else {
            false
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }
}

struct CellInner<T> {
    tracker: LoadTracker,
    value: T,
}

/// View-model slot shared between the loader and the renderer.
pub struct DashboardCell<T> {
    inner: RwLock<CellInner<T>>,
}

impl<T: Clone + Default> DashboardCell<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CellInner {
                tracker: LoadTracker::default(),
                value: T::default(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CellInner<T>>, CoreError> {
        self.inner.read().map_err(|_| CoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CellInner<T>>, CoreError> {
        self.inner.write().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn begin(&self) -> Result<LoadTicket, CoreError> {
        Ok(self.write()?.tracker.issue())
    }

    /// Store `value` if `ticket` is the newest finished load. Returns
    /// whether it was applied.
    pub fn finish(&self, ticket: LoadTicket, value: T) -> Result<bool, CoreError> {
        let mut inner = self.write()?;
        let apply = inner.tracker.settle(ticket);
        if apply {
            inner.value = value;
        } else {
            tracing::debug!(generation = ticket.0, "discarding stale dashboard load");
        }
        Ok(apply)
    }

    pub fn snapshot(&self) -> Result<T, CoreError> {
        Ok(self.read()?.value.clone())
    }

    pub fn is_loading(&self) -> Result<bool, CoreError> {
        Ok(self.read()?.tracker.is_loading())
    }

    /// Run `load` under a fresh ticket and apply its result if still newest.
    pub fn load_with<F>(&self, load: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> T,
    {
        let ticket = self.begin()?;
        let value = load();
        self.finish(ticket, value)?;
        self.snapshot()
    }
}

impl<T: Clone + Default> Default for DashboardCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
