use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Classification of a clocked time range. Closed enum so that a new
/// category fails to compile until it is classified into a bucket below.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum HourCategory {
    Regular,
    Holiday,
    Weekend,
    Overtime,
    Bonus,
    WorkFromHome,
    OnLeave,
}

/// Which aggregate field a category's hours contribute to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HourBucket {
    Regular,
    Overtime,
    HolidayOvertime,
    Leave,
}

impl HourCategory {
    pub fn bucket(self) -> HourBucket {
        match self {
            HourCategory::Regular | HourCategory::Bonus | HourCategory::WorkFromHome => {
                HourBucket::Regular
            }
            HourCategory::Weekend | HourCategory::Overtime => HourBucket::Overtime,
            HourCategory::Holiday => HourBucket::HolidayOvertime,
            HourCategory::OnLeave => HourBucket::Leave,
        }
    }

    /// Everything except the on-leave marker counts as worked time.
    pub fn is_worked_time(self) -> bool {
        !matches!(self, HourCategory::OnLeave)
    }
}
