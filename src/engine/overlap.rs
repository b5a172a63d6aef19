use crate::error::EngineError;
use crate::model::category::HourCategory;
use crate::model::status::ApprovalStatus;
use crate::model::time_entry::TimeEntry;
use chrono::NaiveDate;

/// Seconds since midnight parsed from `HH:MM`, `HH:MM:SS` or `HH:MM:SS±TZ`.
/// Anything else is a validation error, never a silent zero.
pub fn parse_time_of_day(raw: &str) -> Result<u32, EngineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation("empty time-of-day".into()));
    }

    // Strip a trailing timezone offset ("08:00:00+06:00"). Times carry no
    // leading sign, so any '+'/'-' past position 0 starts the offset.
    let base = match trimmed.find(['+', '-']) {
        Some(pos) if pos > 0 => &trimmed[..pos],
        _ => trimmed,
    };

    let fields: Vec<&str> = base.split(':').collect();
    if fields.len() < 2 || fields.len() > 3 {
        return Err(EngineError::Validation(format!(
            "unrecognized time-of-day '{raw}'"
        )));
    }

    let mut parsed = [0u32; 3];
    for (i, field) in fields.iter().enumerate() {
        parsed[i] = field.parse().map_err(|_| {
            EngineError::Validation(format!("unrecognized time-of-day '{raw}'"))
        })?;
    }

    let [hour, minute, second] = parsed;
    if hour > 23 || minute > 59 || second > 59 {
        return Err(EngineError::Validation(format!(
            "time-of-day out of range '{raw}'"
        )));
    }

    Ok(hour * 3600 + minute * 60 + second)
}

/// Half-open `[start, end)` clocked range on one date, one category.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub date: NaiveDate,
    pub category: HourCategory,
    pub start_secs: u32,
    pub end_secs: u32,
}

impl TimeRange {
    pub fn new(date: NaiveDate, category: HourCategory, start_secs: u32, end_secs: u32) -> Self {
        Self {
            date,
            category,
            start_secs,
            end_secs,
        }
    }

    /// Zero-duration marker for on-leave entries; overlaps nothing.
    pub fn on_leave(date: NaiveDate) -> Self {
        Self::new(date, HourCategory::OnLeave, 0, 0)
    }

    /// Range of a stored entry, or `None` when its clock strings no longer
    /// parse. Malformed legacy rows are skipped during conflict checks
    /// rather than blocking the submission.
    pub fn from_entry(entry: &TimeEntry) -> Option<Self> {
        if entry.category == HourCategory::OnLeave {
            return Some(Self::on_leave(entry.date));
        }

        let start = parse_time_of_day(&entry.clock_in);
        let end = parse_time_of_day(&entry.clock_out);
        match (start, end) {
            (Ok(start_secs), Ok(end_secs)) => {
                Some(Self::new(entry.date, entry.category, start_secs, end_secs))
            }
            _ => {
                tracing::warn!(
                    entry_id = entry.id,
                    employee_id = entry.employee_id,
                    clock_in = %entry.clock_in,
                    clock_out = %entry.clock_out,
                    "Skipping conflict check for entry with malformed clocks"
                );
                None
            }
        }
    }
}

/// Two ranges conflict iff date and category match and the half-open
/// intervals intersect. Back-to-back entries (a.end == b.start) never
/// conflict.
pub fn overlaps(existing: &TimeRange, candidate: &TimeRange) -> bool {
    existing.date == candidate.date
        && existing.category == candidate.category
        && candidate.start_secs < existing.end_secs
        && candidate.end_secs > existing.start_secs
}

/// Does `candidate` collide with any non-rejected entry in `existing`?
/// Single source of truth for both the self-service and bulk paths.
pub fn has_conflict(candidate: &TimeRange, existing: &[TimeEntry]) -> bool {
    existing
        .iter()
        .filter(|entry| entry.status != ApprovalStatus::Rejected)
        .filter(|entry| entry.date == candidate.date && entry.category == candidate.category)
        .any(|entry| {
            if candidate.category == HourCategory::OnLeave {
                // at most one leave marker per employee per day
                true
            } else {
                TimeRange::from_entry(entry)
                    .map(|range| overlaps(&range, candidate))
                    .unwrap_or(false)
            }
        })
}
