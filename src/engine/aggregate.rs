use crate::model::category::HourBucket;
use crate::model::leave_request::LeaveRequest;
use crate::model::status::ApprovalStatus;
use crate::model::summary::PeriodSummary;
use crate::model::time_entry::TimeEntry;
use chrono::Datelike;

/// Folds an employee's entries and leave requests into a period summary.
///
/// `entries` is expected to be pre-filtered to the target month's date range
/// (the store query does that); leave requests are matched here on the month
/// their `start_date` falls in. Rejected records contribute nothing. Empty
/// input is a valid all-zero result, not an error.
pub fn aggregate(
    entries: &[TimeEntry],
    leave_requests: &[LeaveRequest],
    employee_id: u64,
    month: u32,
    year: i32,
    expected_working_days: u32,
) -> PeriodSummary {
    let mut summary = PeriodSummary::zero(employee_id, month, year);

    for entry in entries {
        if entry.status == ApprovalStatus::Rejected {
            continue;
        }
        if entry.category.is_worked_time() {
            summary.days_worked += 1;
        }
        match entry.category.bucket() {
            HourBucket::Regular => summary.regular_hours += entry.hours,
            HourBucket::Overtime => summary.overtime_hours += entry.hours,
            HourBucket::HolidayOvertime => summary.holiday_overtime_hours += entry.hours,
            HourBucket::Leave => {}
        }
    }
    summary.total_hours =
        summary.regular_hours + summary.overtime_hours + summary.holiday_overtime_hours;

    summary.leave_days = leave_requests
        .iter()
        .filter(|leave| leave.status != ApprovalStatus::Rejected)
        .filter(|leave| leave.start_date.month() == month && leave.start_date.year() == year)
        .map(|leave| leave.days_count)
        .sum();

    if expected_working_days > 0 {
        summary.attendance_rate =
            summary.days_worked as f64 / expected_working_days as f64 * 100.0;
    }

    summary
}
