//! Periodic portfolio snapshot tick.
//!
//! Grounded on the teacher's `main.rs` background-task spawn for its
//! periodic funding-rate poll: a `tokio::time::interval` loop owned by a
//! cancellable handle rather than a bare `tokio::spawn` nobody can stop.

use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::competition::manager::CompetitionManager;

/// Every scheduler that has ever called `start()` registers itself here so
/// `clear_all_timers` (a test seam) can stop all outstanding ticks without
/// each test needing a handle to every scheduler it constructed.
fn registry() -> &'static Mutex<Vec<Arc<SnapshotScheduler>>> {
    static REGISTRY: OnceLock<Mutex<Vec<Arc<SnapshotScheduler>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

pub struct SnapshotScheduler {
    competitions: Arc<CompetitionManager>,
    interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SnapshotScheduler {
    pub fn new(competitions: Arc<CompetitionManager>, interval_ms: u64) -> Self {
        Self {
            competitions,
            interval: Duration::from_millis(interval_ms.max(1)),
            handle: Mutex::new(None),
        }
    }

    /// Start the recurring tick. No-op if already running. `test_mode`
    /// callers must check the config flag themselves before calling this;
    /// the scheduler has no opinion about it.
    pub fn start(self: &Arc<Self>) {
        if self.handle.lock().is_some() {
            return;
        }
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.interval);
            loop {
                ticker.tick().await;
                this.run_tick().await;
            }
        });
        *self.handle.lock() = Some(handle);
        registry().lock().push(Arc::clone(self));
    }

    async fn run_tick(&self) {
        let active = match self.competitions.list_active().await {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "failed to list active competitions for snapshot tick");
                return;
            }
        };
        for competition in active {
            if let Err(e) = self.competitions.take_portfolio_snapshots(competition.id).await {
                error!(competition_id = %competition.id, error = %e, "snapshot tick failed");
            } else {
                info!(competition_id = %competition.id, "snapshot tick completed");
            }
        }
    }

    /// Stop this scheduler's tick. Draining the current tick before exit is
    /// handled by `take_portfolio_snapshots`'s own serialization; aborting
    /// the loop between ticks is sufficient since no tick is left partially
    /// applied (each team's snapshot insert commits independently).
    pub fn stop_snapshot_scheduler(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }

    /// Stop and restart with the same interval. Test seam.
    pub fn reset(self: &Arc<Self>) {
        self.stop_snapshot_scheduler();
        self.start();
    }

    /// Aborts every scheduler tick started in this process and clears the
    /// registry. Test seam only; production shutdown should prefer
    /// `stop_snapshot_scheduler` on the specific instance it owns.
    pub fn clear_all_timers() {
        for scheduler in registry().lock().drain(..) {
            scheduler.stop_snapshot_scheduler();
        }
    }
}
