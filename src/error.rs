use crate::model::category::HourCategory;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// An overlapping entry already exists for the same employee, date and
    /// category.
    #[error("overlapping {category} entry for employee {employee_id} on {date}")]
    Conflict {
        employee_id: u64,
        category: HourCategory,
        date: NaiveDate,
    },

    /// Bulk submission where every single target conflicted.
    #[error("all targets already have a conflicting {category} entry on {date}: {employee_ids:?}")]
    AllConflicting {
        employee_ids: Vec<u64>,
        category: HourCategory,
        date: NaiveDate,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    /// Retryable I/O failure from the record store.
    #[error("transient store failure: {0}")]
    TransientStore(String),
}
