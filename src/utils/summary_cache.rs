use crate::model::summary::PeriodSummary;
use moka::future::Cache;
use std::time::Duration;

/// (employee_id, month, year)
pub type PeriodKey = (u64, u32, i32);

/// TTL-bounded cache of computed period summaries. The TTL doubles as the
/// staleness window; mutations invalidate the touched period eagerly.
pub struct SummaryCache {
    inner: Cache<PeriodKey, PeriodSummary>,
}

impl SummaryCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, employee_id: u64, month: u32, year: i32) -> Option<PeriodSummary> {
        self.inner.get(&(employee_id, month, year)).await
    }

    pub async fn put(&self, summary: PeriodSummary) {
        self.inner
            .insert(
                (summary.employee_id, summary.month, summary.year),
                summary,
            )
            .await;
    }

    pub async fn invalidate(&self, employee_id: u64, month: u32, year: i32) {
        self.inner.invalidate(&(employee_id, month, year)).await;
    }
}
