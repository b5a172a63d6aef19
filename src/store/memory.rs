use super::{RecordStore, RoleDirectory, StoreError};
use crate::model::category::HourCategory;
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest};
use crate::model::role::Role;
use crate::model::status::ApprovalStatus;
use crate::model::time_entry::{NewTimeEntry, ProofRef, TimeEntry};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    entries: HashMap<u64, TimeEntry>,
    leaves: HashMap<u64, LeaveRequest>,
    roles: HashMap<u64, Role>,
}

/// In-memory record store and role directory, used in tests and as the
/// embedded default backend. Id assignment is monotonic per table; writes
/// and compare-and-set updates serialize on one write lock.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    next_entry_id: AtomicU64,
    next_leave_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the role directory.
    pub async fn put_role(&self, employee_id: u64, role: Role) {
        self.tables.write().await.roles.insert(employee_id, role);
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find_entries(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
        category: Option<HourCategory>,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        let tables = self.tables.read().await;
        let mut found: Vec<TimeEntry> = tables
            .entries
            .values()
            .filter(|entry| entry.employee_id == employee_id)
            .filter(|entry| entry.date >= from && entry.date <= to)
            .filter(|entry| category.is_none_or(|c| entry.category == c))
            .cloned()
            .collect();
        found.sort_by_key(|entry| entry.id);
        Ok(found)
    }

    async fn entry(&self, id: u64) -> Result<Option<TimeEntry>, StoreError> {
        Ok(self.tables.read().await.entries.get(&id).cloned())
    }

    async fn insert_entries(&self, rows: Vec<NewTimeEntry>) -> Result<Vec<TimeEntry>, StoreError> {
        let mut tables = self.tables.write().await;
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let id = self.next_entry_id.fetch_add(1, Ordering::SeqCst) + 1;
            let entry = TimeEntry {
                id,
                employee_id: row.employee_id,
                date: row.date,
                clock_in: row.clock_in,
                clock_out: row.clock_out,
                hours: row.hours,
                category: row.category,
                notes: row.notes,
                proof: row.proof,
                status: row.status,
                approved_by: row.approved_by,
                approved_at: row.approved_at,
            };
            tables.entries.insert(id, entry.clone());
            stored.push(entry);
        }
        Ok(stored)
    }

    async fn update_entry_status(
        &self,
        id: u64,
        to: ApprovalStatus,
        actor_id: u64,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.entries.get_mut(&id) {
            Some(entry) if entry.status == ApprovalStatus::Pending => {
                entry.status = to;
                entry.approved_by = Some(actor_id);
                entry.approved_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_entry_proof(
        &self,
        id: u64,
        proof: Option<ProofRef>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.entries.get_mut(&id) {
            Some(entry) => {
                entry.proof = proof;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_entry(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.entries.remove(&id).is_some())
    }

    async fn find_leave_requests(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        use chrono::Datelike;

        let tables = self.tables.read().await;
        let mut found: Vec<LeaveRequest> = tables
            .leaves
            .values()
            .filter(|leave| leave.employee_id == employee_id)
            .filter(|leave| leave.start_date.year() == year)
            .cloned()
            .collect();
        found.sort_by_key(|leave| leave.id);
        Ok(found)
    }

    async fn leave_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self.tables.read().await.leaves.get(&id).cloned())
    }

    async fn insert_leave_request(
        &self,
        row: NewLeaveRequest,
    ) -> Result<LeaveRequest, StoreError> {
        let mut tables = self.tables.write().await;
        let id = self.next_leave_id.fetch_add(1, Ordering::SeqCst) + 1;
        let leave = LeaveRequest {
            id,
            employee_id: row.employee_id,
            leave_type: row.leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            days_count: row.days_count,
            reason: row.reason,
            status: ApprovalStatus::Pending,
            approved_by: None,
            rejection_reason: None,
        };
        tables.leaves.insert(id, leave.clone());
        Ok(leave)
    }

    async fn update_leave_status(
        &self,
        id: u64,
        to: ApprovalStatus,
        actor_id: u64,
        rejection_reason: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.leaves.get_mut(&id) {
            Some(leave) if leave.status == ApprovalStatus::Pending => {
                leave.status = to;
                leave.approved_by = Some(actor_id);
                if to == ApprovalStatus::Rejected {
                    leave.rejection_reason = rejection_reason;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl RoleDirectory for InMemoryStore {
    async fn role_of(&self, employee_id: u64) -> Result<Option<Role>, StoreError> {
        Ok(self.tables.read().await.roles.get(&employee_id).copied())
    }
}
