use crate::engine::overlap::{TimeRange, has_conflict};
use crate::model::time_entry::TimeEntry;
use std::collections::HashMap;

/// Disjoint, exhaustive split of bulk-submission targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub accepted: Vec<u64>,
    pub conflicting: Vec<u64>,
}

/// Splits `targets` into those the candidate range can be inserted for and
/// those with an existing conflicting entry. Pure; the caller decides what
/// to insert and how to report the skipped ones.
pub fn partition(
    candidate: &TimeRange,
    targets: &[u64],
    existing_by_employee: &HashMap<u64, Vec<TimeEntry>>,
) -> Partition {
    let mut accepted = Vec::new();
    let mut conflicting = Vec::new();

    for &target in targets {
        let existing = existing_by_employee
            .get(&target)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        if has_conflict(candidate, existing) {
            conflicting.push(target);
        } else {
            accepted.push(target);
        }
    }

    Partition {
        accepted,
        conflicting,
    }
}
