use crate::error::EngineError;
use crate::model::status::ApprovalStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Vacation,
    Sick,
    Personal,
    Unpaid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Inclusive calendar-day count; not business-day aware.
    pub days_count: i64,
    pub reason: Option<String>,
    pub status: ApprovalStatus,
    pub approved_by: Option<u64>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveDraft {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

impl LeaveDraft {
    /// Validates the date window and returns the inclusive day count.
    pub fn validate(&self) -> Result<i64, EngineError> {
        if self.start_date > self.end_date {
            return Err(EngineError::Validation(
                "start_date cannot be after end_date".into(),
            ));
        }
        Ok(inclusive_days(self.start_date, self.end_date))
    }
}

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_count: i64,
    pub reason: Option<String>,
}

pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}
