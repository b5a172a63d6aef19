use crate::error::EngineError;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

type RefreshFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), EngineError>> + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct RefreshOptions {
    /// How long a completed refresh stays fresh.
    pub stale_time: Duration,
    /// Whether the consuming view starts out visible.
    pub start_visible: bool,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(300),
            start_visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RefreshTrigger {
    Timer,
    VisibilityGained,
    FocusGained,
    ConnectivityRestored,
    Manual,
}

/// Decides when a cached aggregate must be recomputed. While the consuming
/// view is visible, the periodic timer and the visibility / focus /
/// connectivity signals all re-invoke the refresh operation once the last
/// completed run is older than `stale_time`; a manual trigger bypasses the
/// staleness check. At most one refresh runs at a time per coordinator,
/// enforced by an explicit atomic flag rather than ambient state.
pub struct RefreshCoordinator {
    refresh_fn: RefreshFn,
    stale_time: Duration,
    visible: AtomicBool,
    in_flight: AtomicBool,
    last_refresh: StdMutex<Option<Instant>>,
}

impl RefreshCoordinator {
    /// Spawns the periodic timer and returns the handle consumers feed
    /// signals through. The timer fires every
    /// `min(30s, max(1s, stale_time / 2))`.
    pub fn register<F, Fut>(refresh_fn: F, options: RefreshOptions) -> RefreshHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), EngineError>> + Send + 'static,
    {
        let coordinator = Arc::new(Self {
            refresh_fn: Arc::new(move || refresh_fn().boxed()),
            stale_time: options.stale_time,
            visible: AtomicBool::new(options.start_visible),
            in_flight: AtomicBool::new(false),
            last_refresh: StdMutex::new(None),
        });

        let timer = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move {
                let mut interval = tokio::time::interval(tick_period(coordinator.stale_time));
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // the immediate first tick is not a cycle
                interval.tick().await;
                loop {
                    interval.tick().await;
                    coordinator.maybe_refresh(RefreshTrigger::Timer).await;
                }
            }
        });

        RefreshHandle { coordinator, timer }
    }

    async fn maybe_refresh(&self, trigger: RefreshTrigger) {
        if !self.visible.load(Ordering::SeqCst) {
            return;
        }
        if !self.is_stale() {
            return;
        }
        self.run_refresh(trigger).await;
    }

    async fn run_refresh(&self, trigger: RefreshTrigger) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!(?trigger, "refresh already in flight; skipping");
            return;
        }
        // clear the flag on every exit path, a panicking refresh included
        struct InFlightReset<'a>(&'a AtomicBool);
        impl Drop for InFlightReset<'_> {
            fn drop(&mut self) {
                self.0.store(false, Ordering::SeqCst);
            }
        }
        let _reset = InFlightReset(&self.in_flight);

        // the staleness clock resets when the run starts, not when it ends
        self.touch();

        tracing::debug!(?trigger, "recomputing");
        let result = (self.refresh_fn)().await;

        // the clock advances even on failure so a broken refresh cannot
        // turn into a retry storm
        self.touch();

        if let Err(e) = result {
            tracing::warn!(error = %e, ?trigger, "Refresh failed; next cycle will retry");
        }
    }

    fn is_stale(&self) -> bool {
        match *self
            .last_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
        {
            None => true,
            Some(at) => at.elapsed() > self.stale_time,
        }
    }

    fn touch(&self) {
        *self
            .last_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }
}

fn tick_period(stale_time: Duration) -> Duration {
    (stale_time / 2).clamp(Duration::from_secs(1), Duration::from_secs(30))
}

/// Consumer-side handle; dropping it stops the timer.
pub struct RefreshHandle {
    coordinator: Arc<RefreshCoordinator>,
    timer: JoinHandle<()>,
}

impl RefreshHandle {
    /// Invokes the refresh unconditionally, bypassing the staleness check
    /// but still respecting the single-flight guarantee.
    pub async fn manual_refresh(&self) {
        self.coordinator.run_refresh(RefreshTrigger::Manual).await;
    }

    pub async fn set_visible(&self, visible: bool) {
        let was_visible = self.coordinator.visible.swap(visible, Ordering::SeqCst);
        if visible && !was_visible {
            self.coordinator
                .maybe_refresh(RefreshTrigger::VisibilityGained)
                .await;
        }
    }

    pub async fn focus_gained(&self) {
        self.coordinator.maybe_refresh(RefreshTrigger::FocusGained).await;
    }

    pub async fn connectivity_restored(&self) {
        self.coordinator
            .maybe_refresh(RefreshTrigger::ConnectivityRestored)
            .await;
    }

    pub fn is_refreshing(&self) -> bool {
        self.coordinator.in_flight.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        self.timer.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.timer.abort();
    }
}
