use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

// Load .env once per process, before the first env read.
static ENV_LOADED: Lazy<()> = Lazy::new(|| {
    dotenv().ok();
});

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Denominator for the attendance rate. Expected working days per period
    /// is business configuration supplied from outside, never derived here.
    pub expected_working_days: u32,

    /// How long a cached period summary stays fresh, in seconds.
    pub summary_stale_secs: u64,

    /// Max number of cached period summaries.
    pub summary_cache_capacity: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expected_working_days: 22,
            summary_stale_secs: 300,
            summary_cache_capacity: 10_000,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Lazy::force(&ENV_LOADED);

        let defaults = Self::default();
        Self {
            expected_working_days: env::var("EXPECTED_WORKING_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.expected_working_days),
            summary_stale_secs: env::var("SUMMARY_STALE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.summary_stale_secs),
            summary_cache_capacity: env::var("SUMMARY_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.summary_cache_capacity),
        }
    }
}
