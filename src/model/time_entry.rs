use crate::model::category::HourCategory;
use crate::model::status::ApprovalStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fixed clock value stored on on-leave markers; contributes zero duration.
pub const ON_LEAVE_CLOCK: &str = "00:00:00";

/// Opaque reference to a proof-of-work attachment in the blob store. The
/// engine never touches the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRef {
    pub url: String,
    pub display_name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    /// Time-of-day as submitted (`HH:MM`, `HH:MM:SS` or `HH:MM:SS±TZ`).
    /// Parsed tolerantly at comparison time; legacy rows may be malformed.
    pub clock_in: String,
    pub clock_out: String,
    /// Derived from the clocks but stored, unrounded.
    pub hours: f64,
    pub category: HourCategory,
    pub notes: Option<String>,
    pub proof: Option<ProofRef>,
    pub status: ApprovalStatus,
    pub approved_by: Option<u64>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// What a caller submits. The employee(s) it applies to and the resulting
/// status are decided by the submission path, not the draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryDraft {
    pub date: NaiveDate,
    pub clock_in: String,
    pub clock_out: String,
    pub category: HourCategory,
    pub notes: Option<String>,
    pub proof: Option<ProofRef>,
}

/// A validated row ready for insertion.
#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub clock_in: String,
    pub clock_out: String,
    pub hours: f64,
    pub category: HourCategory,
    pub notes: Option<String>,
    pub proof: Option<ProofRef>,
    pub status: ApprovalStatus,
    pub approved_by: Option<u64>,
    pub approved_at: Option<DateTime<Utc>>,
}
