//! Supervised restart of long-running tasks.
//!
//! A crashed task is restarted after a short delay. The stale handle is always
//! aborted before a new one is spawned, so at most one instance of the task
//! runs at a time. Too many restarts inside the window trigger a cooldown.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;

/// Restart limits for a supervised task
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    /// Delay between a crash and the restart
    pub restart_delay: Duration,
    /// Restarts allowed inside `window` before cooling down
    pub max_restarts: u32,
    /// Time window to count restarts in
    pub window: Duration,
    /// Delay used instead of `restart_delay` once the budget is spent
    pub cooldown: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for RestartPolicy {
    fn from(cfg: &SchedulerConfig) -> Self {
        Self {
            restart_delay: Duration::from_millis(cfg.restart_delay_ms),
            max_restarts: cfg.max_restarts,
            window: Duration::from_secs(cfg.restart_window_secs),
            cooldown: Duration::from_secs(cfg.restart_cooldown_secs),
        }
    }
}

/// Sliding-window restart counter
#[derive(Debug, Default)]
struct RestartHistory {
    timestamps: VecDeque<Instant>,
}

impl RestartHistory {
    /// Record a restart at `now` and return how many fall inside `window`.
    fn record(&mut self, now: Instant, window: Duration) -> usize {
        while self
            .timestamps
            .front()
            .is_some_and(|t| now.duration_since(*t) > window)
        {
            self.timestamps.pop_front();
        }
        self.timestamps.push_back(now);
        self.timestamps.len()
    }
}

/// Holds the running task; aborts it when the supervisor itself goes away.
struct TaskSlot(Option<JoinHandle<()>>);

impl Drop for TaskSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

/// Run the task produced by `make_task` until it finishes cleanly, restarting
/// it whenever it panics. Returns the number of restarts performed.
pub async fn supervise<F, Fut>(name: &str, policy: RestartPolicy, mut make_task: F) -> u32
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut current = TaskSlot(None);
    let mut history = RestartHistory::default();
    let mut restarts = 0u32;

    loop {
        if let Some(stale) = current.0.take() {
            stale.abort();
        }
        let handle = current.0.insert(tokio::spawn(make_task()));

        match handle.await {
            Ok(()) => {
                info!("{name}: task finished");
                return restarts;
            }
            Err(e) if e.is_cancelled() => {
                info!("{name}: task cancelled");
                return restarts;
            }
            Err(e) => error!("{name}: task crashed: {e}"),
        }

        let recent = history.record(Instant::now(), policy.window);
        let delay = if recent > policy.max_restarts as usize {
            warn!(
                "{name}: {recent} restarts within {:?}, cooling down for {:?}",
                policy.window, policy.cooldown
            );
            policy.cooldown
        } else {
            policy.restart_delay
        };
        tokio::time::sleep(delay).await;
        restarts += 1;
        info!("{name}: restarting (restart #{restarts})");
    }
}
