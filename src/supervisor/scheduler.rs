use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::restart::{supervise, RestartPolicy};
use crate::config::SchedulerConfig;
use crate::engine::{run_tick, EnvironmentContext, TickOutcome};

/// Drives discovery ticks for one environment on a fixed period
pub struct Scheduler {
    ctx: Arc<EnvironmentContext>,
    cfg: SchedulerConfig,
}

impl Scheduler {
    pub fn new(ctx: Arc<EnvironmentContext>, cfg: SchedulerConfig) -> Self {
        Self { ctx, cfg }
    }

    /// Spawn the tick loop under supervision
    pub fn spawn(self) -> JoinHandle<()> {
        let name = format!("scheduler[{}]", self.ctx.cluster());
        let policy = RestartPolicy::from(&self.cfg);
        let interval = Duration::from_secs(self.cfg.tick_interval_secs);
        let ctx = self.ctx;

        tokio::spawn(async move {
            supervise(&name, policy, move || tick_loop(Arc::clone(&ctx), interval)).await;
        })
    }
}

/// Tick forever. Ticks that would start while the previous one is still
/// running are skipped rather than queued.
pub async fn tick_loop(ctx: Arc<EnvironmentContext>, interval: Duration) {
    info!("{}: scheduler started (interval={}s)", ctx.cluster(), interval.as_secs());
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        match run_tick(&ctx).await {
            TickOutcome::Skipped => {}
            TickOutcome::Completed { discovered, cascade } => debug!(
                "{}: tick complete ({} categories, {} dependents subscribed)",
                ctx.cluster(),
                discovered.len(),
                cascade.subscribed
            ),
        }
    }
}
