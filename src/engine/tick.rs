use std::sync::Arc;
use tracing::{debug, error, warn};

use super::cascade::{discover_dependents, CascadeReport};
use super::discovery::{discover_category, DiscoveryReport};
use super::EnvironmentContext;
use crate::domain::Category;

/// Result of one scheduler tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick was still running for this environment
    Skipped,
    Completed {
        /// Per-category reports; categories whose listing failed are absent
        discovered: Vec<(Category, DiscoveryReport)>,
        cascade: CascadeReport,
    },
}

/// One full tick for an environment: discover every category to completion,
/// then cascade into the games' dependents.
///
/// A failed listing only skips its own category for this tick.
pub async fn run_tick(ctx: &Arc<EnvironmentContext>) -> TickOutcome {
    let Some(_guard) = ctx.try_begin_tick() else {
        ctx.record_tick_skipped();
        debug!("{}: previous tick still running, skipping", ctx.cluster());
        return TickOutcome::Skipped;
    };

    let (vaults, rounds, games) = tokio::join!(
        discover_category(ctx, Category::Vault),
        discover_category(ctx, Category::Round),
        discover_category(ctx, Category::Game),
    );

    let mut discovered = Vec::with_capacity(Category::ALL.len());
    for (category, result) in [
        (Category::Vault, vaults),
        (Category::Round, rounds),
        (Category::Game, games),
    ] {
        match result {
            Ok(report) => discovered.push((category, report)),
            Err(e) if e.is_transient() => {
                warn!("{} {category}: discovery failed, retrying next tick: {e}", ctx.cluster())
            }
            Err(e) => error!("{} {category}: discovery failed: {e}", ctx.cluster()),
        }
    }

    let cascade = discover_dependents(ctx);
    ctx.record_tick_completed();

    TickOutcome::Completed { discovered, cascade }
}
