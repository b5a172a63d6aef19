use crate::config::EngineConfig;
use crate::engine::aggregate::aggregate;
use crate::engine::approval::authorize_transition;
use crate::engine::overlap::{TimeRange, has_conflict, parse_time_of_day};
use crate::engine::partition::partition;
use crate::error::EngineError;
use crate::model::category::HourCategory;
use crate::model::leave_request::{LeaveDraft, LeaveRequest, NewLeaveRequest};
use crate::model::role::Actor;
use crate::model::status::ApprovalStatus;
use crate::model::summary::PeriodSummary;
use crate::model::time_entry::{NewTimeEntry, ON_LEAVE_CLOCK, ProofRef, TimeEntry, TimeEntryDraft};
use crate::store::{RecordStore, RoleDirectory};
use crate::utils::summary_cache::SummaryCache;
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// (employee_id, date, category) — the unit of conflict-check serialization.
type EntryKey = (u64, NaiveDate, HourCategory);

#[derive(Debug, Clone, Serialize)]
pub struct SkippedTarget {
    pub employee_id: u64,
    pub reason: String,
}

/// Partial success is success: some targets inserted, the rest reported with
/// a reason, none silently dropped.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    pub accepted: Vec<TimeEntry>,
    pub skipped: Vec<SkippedTarget>,
}

/// The reconciliation engine's consumer-facing surface: submissions,
/// summaries and the approval workflow, over an abstract record store.
pub struct ReconciliationService<S, R> {
    store: Arc<S>,
    roles: Arc<R>,
    config: EngineConfig,
    summaries: SummaryCache,
    entry_locks: Mutex<HashMap<EntryKey, Arc<Mutex<()>>>>,
}

#[derive(Clone)]
struct ValidatedClocks {
    clock_in: String,
    clock_out: String,
    hours: f64,
    start_secs: u32,
    end_secs: u32,
}

impl<S: RecordStore, R: RoleDirectory> ReconciliationService<S, R> {
    pub fn new(store: Arc<S>, roles: Arc<R>, config: EngineConfig) -> Self {
        let summaries = SummaryCache::new(
            config.summary_cache_capacity,
            Duration::from_secs(config.summary_stale_secs),
        );
        Self {
            store,
            roles,
            config,
            summaries,
            entry_locks: Mutex::new(HashMap::new()),
        }
    }

    /* =========================
    Entry submission
    ========================= */

    /// Submits a single entry. Self-submissions land `pending`; a
    /// supervisor submitting on someone else's behalf lands `approved`.
    pub async fn submit_entry(
        &self,
        employee_id: u64,
        draft: TimeEntryDraft,
        actor: &Actor,
    ) -> Result<TimeEntry, EngineError> {
        let on_behalf = !actor.owns(employee_id);
        if on_behalf {
            actor.require_supervisor()?;
        }

        let clocks = validate_clocks(&draft)?;
        let candidate = TimeRange::new(draft.date, draft.category, clocks.start_secs, clocks.end_secs);

        // serialize check-then-insert per (employee, date, category)
        let key = (employee_id, draft.date, draft.category);
        let lock = self.key_lock(key).await;
        let guard = lock.lock().await;

        let outcome = async {
            let existing = self
                .store
                .find_entries(employee_id, draft.date, draft.date, Some(draft.category))
                .await?;
            if has_conflict(&candidate, &existing) {
                return Err(EngineError::Conflict {
                    employee_id,
                    category: draft.category,
                    date: draft.date,
                });
            }

            let row = build_row(employee_id, &draft, clocks, on_behalf, actor);
            let mut inserted = self.store.insert_entries(vec![row]).await?;
            inserted.pop().ok_or_else(|| {
                EngineError::TransientStore("insert returned no rows".into())
            })
        }
        .await;

        drop(guard);
        drop(lock);
        self.prune_key_lock(&key).await;
        let entry = outcome?;

        self.invalidate_period(employee_id, draft.date).await;
        tracing::info!(
            entry_id = entry.id,
            employee_id,
            category = %entry.category,
            status = %entry.status,
            "Time entry recorded"
        );
        Ok(entry)
    }

    /// Bulk submission to many employees at once. Admin/Manager only; every
    /// accepted insertion is created already approved. Conflicting targets
    /// are skipped and reported; if all conflict the whole call fails.
    pub async fn submit_bulk(
        &self,
        draft: TimeEntryDraft,
        targets: &[u64],
        actor: &Actor,
    ) -> Result<BulkOutcome, EngineError> {
        actor.require_supervisor()?;
        if targets.is_empty() {
            return Err(EngineError::Validation("no target employees".into()));
        }

        let mut unique = Vec::with_capacity(targets.len());
        for &target in targets {
            if !unique.contains(&target) {
                unique.push(target);
            }
        }

        let clocks = validate_clocks(&draft)?;
        let candidate = TimeRange::new(draft.date, draft.category, clocks.start_secs, clocks.end_secs);

        // take the per-key locks in id order so concurrent bulks cannot
        // deadlock each other
        let mut ordered = unique.clone();
        ordered.sort_unstable();
        let keys: Vec<EntryKey> = ordered
            .iter()
            .map(|&employee_id| (employee_id, draft.date, draft.category))
            .collect();
        let mut guards = Vec::with_capacity(keys.len());
        for &key in &keys {
            let lock = self.key_lock(key).await;
            guards.push(lock.lock_owned().await);
        }

        let outcome = async {
            let mut existing_by_employee = HashMap::with_capacity(unique.len());
            for &employee_id in &unique {
                let existing = self
                    .store
                    .find_entries(employee_id, draft.date, draft.date, Some(draft.category))
                    .await?;
                existing_by_employee.insert(employee_id, existing);
            }

            let split = partition(&candidate, &unique, &existing_by_employee);
            if split.accepted.is_empty() {
                return Err(EngineError::AllConflicting {
                    employee_ids: split.conflicting,
                    category: draft.category,
                    date: draft.date,
                });
            }

            let rows = split
                .accepted
                .iter()
                .map(|&employee_id| build_row(employee_id, &draft, clocks.clone(), true, actor))
                .collect();
            let accepted = self.store.insert_entries(rows).await?;
            Ok((accepted, split.conflicting))
        }
        .await;

        drop(guards);
        for key in &keys {
            self.prune_key_lock(key).await;
        }
        let (accepted, conflicting) = outcome?;

        for entry in &accepted {
            self.invalidate_period(entry.employee_id, entry.date).await;
        }

        let skipped: Vec<SkippedTarget> = conflicting
            .into_iter()
            .map(|employee_id| SkippedTarget {
                employee_id,
                reason: skip_reason(draft.category, draft.date),
            })
            .collect();

        if skipped.is_empty() {
            tracing::info!(
                count = accepted.len(),
                category = %draft.category,
                date = %draft.date,
                "Bulk entry recorded for all targets"
            );
        } else {
            tracing::warn!(
                accepted = accepted.len(),
                skipped = skipped.len(),
                category = %draft.category,
                date = %draft.date,
                "Bulk entry partially recorded; conflicting targets skipped"
            );
        }

        Ok(BulkOutcome { accepted, skipped })
    }

    /* =========================
    Period summary
    ========================= */

    pub async fn period_summary(
        &self,
        employee_id: u64,
        month: u32,
        year: i32,
    ) -> Result<PeriodSummary, EngineError> {
        if let Some(cached) = self.summaries.get(employee_id, month, year).await {
            return Ok(cached);
        }

        let (from, to) = month_bounds(month, year)?;
        let entries = self.store.find_entries(employee_id, from, to, None).await?;
        let leaves = self.store.find_leave_requests(employee_id, year).await?;

        let summary = aggregate(
            &entries,
            &leaves,
            employee_id,
            month,
            year,
            self.config.expected_working_days,
        );
        self.summaries.put(summary.clone()).await;
        Ok(summary)
    }

    /* =========================
    Leave requests
    ========================= */

    /// Files a leave request; always starts out `pending`.
    pub async fn submit_leave(
        &self,
        employee_id: u64,
        draft: LeaveDraft,
        actor: &Actor,
    ) -> Result<LeaveRequest, EngineError> {
        if !actor.owns(employee_id) {
            actor.require_supervisor()?;
        }
        let days_count = draft.validate()?;

        let leave = self
            .store
            .insert_leave_request(NewLeaveRequest {
                employee_id,
                leave_type: draft.leave_type,
                start_date: draft.start_date,
                end_date: draft.end_date,
                days_count,
                reason: draft.reason,
            })
            .await?;

        // pending leave already counts toward the period totals
        self.invalidate_period(employee_id, leave.start_date).await;
        tracing::info!(
            leave_id = leave.id,
            employee_id,
            leave_type = %leave.leave_type,
            days_count,
            "Leave request submitted"
        );
        Ok(leave)
    }

    /* =========================
    Approval workflow
    ========================= */

    pub async fn approve_entry(&self, id: u64, actor: &Actor) -> Result<TimeEntry, EngineError> {
        self.transition_entry(id, ApprovalStatus::Approved, actor).await
    }

    pub async fn reject_entry(&self, id: u64, actor: &Actor) -> Result<TimeEntry, EngineError> {
        self.transition_entry(id, ApprovalStatus::Rejected, actor).await
    }

    pub async fn approve_leave(&self, id: u64, actor: &Actor) -> Result<LeaveRequest, EngineError> {
        self.transition_leave(id, ApprovalStatus::Approved, actor, None).await
    }

    pub async fn reject_leave(
        &self,
        id: u64,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<LeaveRequest, EngineError> {
        self.transition_leave(id, ApprovalStatus::Rejected, actor, reason).await
    }

    async fn transition_entry(
        &self,
        id: u64,
        to: ApprovalStatus,
        actor: &Actor,
    ) -> Result<TimeEntry, EngineError> {
        let entry = self
            .store
            .entry(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Time entry {id} not found")))?;
        self.authorize_for_owner(entry.employee_id, actor).await?;

        let changed = self
            .store
            .update_entry_status(id, to, actor.user_id, Utc::now())
            .await?;
        if !changed {
            return Err(EngineError::NotFound(
                "Time entry not found or already processed".into(),
            ));
        }

        self.invalidate_period(entry.employee_id, entry.date).await;
        tracing::info!(entry_id = id, actor_id = actor.user_id, status = %to, "Time entry transitioned");

        self.store
            .entry(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Time entry {id} not found")))
    }

    async fn transition_leave(
        &self,
        id: u64,
        to: ApprovalStatus,
        actor: &Actor,
        rejection_reason: Option<String>,
    ) -> Result<LeaveRequest, EngineError> {
        let leave = self
            .store
            .leave_request(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Leave request {id} not found")))?;
        self.authorize_for_owner(leave.employee_id, actor).await?;

        let changed = self
            .store
            .update_leave_status(id, to, actor.user_id, rejection_reason)
            .await?;
        if !changed {
            return Err(EngineError::NotFound(
                "Leave request not found or already processed".into(),
            ));
        }

        self.invalidate_period(leave.employee_id, leave.start_date).await;
        tracing::info!(leave_id = id, actor_id = actor.user_id, status = %to, "Leave request transitioned");

        self.store
            .leave_request(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Leave request {id} not found")))
    }

    /* =========================
    Deletion & attachments
    ========================= */

    pub async fn delete_entry(&self, id: u64, actor: &Actor) -> Result<(), EngineError> {
        let entry = self.require_entry_access(id, actor).await?;
        if !self.store.delete_entry(id).await? {
            return Err(EngineError::NotFound(format!("Time entry {id} not found")));
        }
        self.invalidate_period(entry.employee_id, entry.date).await;
        tracing::info!(entry_id = id, actor_id = actor.user_id, "Time entry deleted");
        Ok(())
    }

    pub async fn attach_proof(
        &self,
        id: u64,
        proof: ProofRef,
        actor: &Actor,
    ) -> Result<(), EngineError> {
        self.require_entry_access(id, actor).await?;
        if !self.store.set_entry_proof(id, Some(proof)).await? {
            return Err(EngineError::NotFound(format!("Time entry {id} not found")));
        }
        Ok(())
    }

    pub async fn delete_attachment(&self, id: u64, actor: &Actor) -> Result<(), EngineError> {
        self.require_entry_access(id, actor).await?;
        if !self.store.set_entry_proof(id, None).await? {
            return Err(EngineError::NotFound(format!("Time entry {id} not found")));
        }
        tracing::info!(entry_id = id, actor_id = actor.user_id, "Attachment reference removed");
        Ok(())
    }

    /* =========================
    Internals
    ========================= */

    async fn key_lock(&self, key: EntryKey) -> Arc<Mutex<()>> {
        let mut locks = self.entry_locks.lock().await;
        locks.entry(key).or_default().clone()
    }

    /// Keys embed calendar dates, so unused locks must not accumulate.
    /// Only the map's own clone left means nobody is waiting on the key.
    async fn prune_key_lock(&self, key: &EntryKey) {
        let mut locks = self.entry_locks.lock().await;
        if let Some(lock) = locks.get(key) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(key);
            }
        }
    }

    async fn authorize_for_owner(&self, employee_id: u64, actor: &Actor) -> Result<(), EngineError> {
        let owner_role = self
            .roles
            .role_of(employee_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Employee {employee_id} not found")))?;
        authorize_transition(actor, owner_role)
    }

    /// Supervisors may touch any entry, an employee only their own.
    async fn require_entry_access(&self, id: u64, actor: &Actor) -> Result<TimeEntry, EngineError> {
        let entry = self
            .store
            .entry(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Time entry {id} not found")))?;
        if !actor.owns(entry.employee_id) {
            actor.require_supervisor()?;
        }
        Ok(entry)
    }

    async fn invalidate_period(&self, employee_id: u64, date: NaiveDate) {
        self.summaries
            .invalidate(employee_id, date.month(), date.year())
            .await;
    }
}

fn validate_clocks(draft: &TimeEntryDraft) -> Result<ValidatedClocks, EngineError> {
    if draft.category == HourCategory::OnLeave {
        // fixed sentinel clocks, zero duration
        return Ok(ValidatedClocks {
            clock_in: ON_LEAVE_CLOCK.into(),
            clock_out: ON_LEAVE_CLOCK.into(),
            hours: 0.0,
            start_secs: 0,
            end_secs: 0,
        });
    }

    let start_secs = parse_time_of_day(&draft.clock_in)?;
    let end_secs = parse_time_of_day(&draft.clock_out)?;
    if end_secs <= start_secs {
        return Err(EngineError::Validation(
            "clock_out must be after clock_in".into(),
        ));
    }

    Ok(ValidatedClocks {
        clock_in: draft.clock_in.clone(),
        clock_out: draft.clock_out.clone(),
        hours: f64::from(end_secs - start_secs) / 3600.0,
        start_secs,
        end_secs,
    })
}

fn build_row(
    employee_id: u64,
    draft: &TimeEntryDraft,
    clocks: ValidatedClocks,
    on_behalf: bool,
    actor: &Actor,
) -> NewTimeEntry {
    let (status, approved_by, approved_at) = if on_behalf {
        // administratively entered time is auto-approved
        (ApprovalStatus::Approved, Some(actor.user_id), Some(Utc::now()))
    } else {
        (ApprovalStatus::Pending, None, None)
    };

    NewTimeEntry {
        employee_id,
        date: draft.date,
        clock_in: clocks.clock_in,
        clock_out: clocks.clock_out,
        hours: clocks.hours,
        category: draft.category,
        notes: draft.notes.clone(),
        proof: draft.proof.clone(),
        status,
        approved_by,
        approved_at,
    }
}

fn skip_reason(category: HourCategory, date: NaiveDate) -> String {
    if category == HourCategory::OnLeave {
        format!("already has an {category} marker on {date}")
    } else {
        format!("overlapping {category} entry on {date}")
    }
}

fn month_bounds(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate), EngineError> {
    let from = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::Validation(format!("invalid period {month}/{year}")))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let to = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| EngineError::Validation(format!("invalid period {month}/{year}")))?;
    Ok((from, to))
}
