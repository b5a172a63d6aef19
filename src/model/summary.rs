use serde::{Deserialize, Serialize};

/// Per-employee, per-(month, year) attendance roll-up. Recomputed on demand,
/// cached but never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    pub days_worked: u32,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub holiday_overtime_hours: f64,
    pub total_hours: f64,
    pub leave_days: i64,
    /// Percentage of the configured expected working days.
    pub attendance_rate: f64,
}

impl PeriodSummary {
    pub fn zero(employee_id: u64, month: u32, year: i32) -> Self {
        Self {
            employee_id,
            month,
            year,
            days_worked: 0,
            regular_hours: 0.0,
            overtime_hours: 0.0,
            holiday_overtime_hours: 0.0,
            total_hours: 0.0,
            leave_days: 0,
            attendance_rate: 0.0,
        }
    }

    /// Display-only rounding; stored sums stay unrounded.
    pub fn rounded(&self) -> Self {
        Self {
            regular_hours: round2(self.regular_hours),
            overtime_hours: round2(self.overtime_hours),
            holiday_overtime_hours: round2(self.holiday_overtime_hours),
            total_hours: round2(self.total_hours),
            attendance_rate: round1(self.attendance_rate),
            ..self.clone()
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
