pub mod memory;

use crate::error::EngineError;
use crate::model::category::HourCategory;
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest};
use crate::model::role::Role;
use crate::model::status::ApprovalStatus;
use crate::model::time_entry::{NewTimeEntry, ProofRef, TimeEntry};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("transient store failure: {0}")]
    Transient(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => EngineError::NotFound(what),
            StoreError::Transient(what) => EngineError::TransientStore(what),
        }
    }
}

/// Persistent record store consumed by the engine. Implementations must make
/// `insert_entries` all-or-nothing and the status updates an atomic
/// compare-and-set against `pending`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Entries for one employee with `date` in `[from, to]`, optionally
    /// narrowed to a single category.
    async fn find_entries(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
        category: Option<HourCategory>,
    ) -> Result<Vec<TimeEntry>, StoreError>;

    async fn entry(&self, id: u64) -> Result<Option<TimeEntry>, StoreError>;

    /// All-or-nothing batch insert; returns the stored rows with assigned ids.
    async fn insert_entries(&self, rows: Vec<NewTimeEntry>) -> Result<Vec<TimeEntry>, StoreError>;

    /// Compare-and-set `pending -> to`, stamping the approval fields.
    /// Returns `false` when no pending row matched (absent or already
    /// processed).
    async fn update_entry_status(
        &self,
        id: u64,
        to: ApprovalStatus,
        actor_id: u64,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Replaces (or clears) the proof attachment reference.
    async fn set_entry_proof(&self, id: u64, proof: Option<ProofRef>)
    -> Result<bool, StoreError>;

    /// Removes the entry and its attachment reference with it.
    async fn delete_entry(&self, id: u64) -> Result<bool, StoreError>;

    async fn find_leave_requests(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveRequest>, StoreError>;

    async fn leave_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;

    async fn insert_leave_request(
        &self,
        row: NewLeaveRequest,
    ) -> Result<LeaveRequest, StoreError>;

    /// Compare-and-set `pending -> to` for a leave request; an optional
    /// free-text reason is recorded on rejection.
    async fn update_leave_status(
        &self,
        id: u64,
        to: ApprovalStatus,
        actor_id: u64,
        rejection_reason: Option<String>,
    ) -> Result<bool, StoreError>;
}

/// Identity/role provider: the only thing the engine asks about a user is
/// which role an employee record carries.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn role_of(&self, employee_id: u64) -> Result<Option<Role>, StoreError>;
}
