//! Cascade discovery: subscribe each known game's dependent history accounts
//! and fold their updates into the game's history entry.

use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use super::EnvironmentContext;
use crate::adapters::{FailureCallback, UpdateCallback};
use crate::domain::{AccountKind, Address, Category, GameAccount, Payload};
use crate::error::MirrorError;

/// Outcome of one cascade pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Games with a cached payload that were inspected
    pub games: usize,
    /// Games whose payload did not carry usable references
    pub unreadable: usize,
    /// Dependent subscriptions installed
    pub subscribed: usize,
}

/// Install subscriptions for the dependents of every known game.
///
/// References are read from each game's current cached payload on every pass;
/// a dependent that is already subscribed is left untouched.
pub fn discover_dependents(ctx: &Arc<EnvironmentContext>) -> CascadeReport {
    let mut report = CascadeReport::default();
    let fetcher = ctx.fetcher();

    for address in ctx.members(Category::Game) {
        let Some(payload) = fetcher.data(&address) else {
            continue;
        };
        let game = match GameAccount::from_payload(address, payload) {
            Ok(game) => game,
            Err(e) => {
                report.unreadable += 1;
                warn!("{} game {address}: cannot read dependents: {e}", ctx.cluster());
                continue;
            }
        };
        report.games += 1;

        for (kind, dependent) in game.dependents() {
            if fetcher.contains(&dependent) {
                continue;
            }
            let installed = fetcher.add_program(
                kind,
                dependent,
                Arc::clone(ctx.program()),
                None,
                merge_into_history(Arc::downgrade(ctx), address, kind, dependent),
                evict_dependent_on_failure(Arc::downgrade(ctx), address, kind, dependent),
            );
            if installed {
                report.subscribed += 1;
                debug!("{} game {address}: watching {kind} {dependent}", ctx.cluster());
            }
        }
    }

    if report.subscribed > 0 {
        info!(
            "{} cascade: {} games, {} dependents subscribed",
            ctx.cluster(),
            report.games,
            report.subscribed
        );
    }
    report
}

/// Whether `game`'s cached payload still points its `kind` slot at `dependent`
fn still_referenced(ctx: &EnvironmentContext, game: Address, kind: AccountKind, dependent: Address) -> bool {
    ctx.fetcher()
        .data(&game)
        .and_then(|payload| GameAccount::from_payload(game, payload).ok())
        .is_some_and(|g| g.dependents().contains(&(kind, dependent)))
}

fn merge_into_history(
    ctx: Weak<EnvironmentContext>,
    game: Address,
    kind: AccountKind,
    dependent: Address,
) -> UpdateCallback {
    Arc::new(move |payload: &Payload| {
        let Some(ctx) = ctx.upgrade() else {
            return;
        };
        // The game moved on to another account (or is gone); drop the stale feed.
        if !still_referenced(&ctx, game, kind, dependent) {
            debug!(
                "{} game {game}: {kind} {dependent} no longer referenced, unsubscribing",
                ctx.cluster()
            );
            ctx.evict_dependent(&dependent);
            return;
        }
        ctx.merge_history(game, kind, payload.clone());
    })
}

fn evict_dependent_on_failure(
    ctx: Weak<EnvironmentContext>,
    game: Address,
    kind: AccountKind,
    dependent: Address,
) -> FailureCallback {
    Arc::new(move |err: &MirrorError| {
        let Some(ctx) = ctx.upgrade() else {
            return;
        };
        warn!(
            "{} game {game}: {kind} {dependent} failed, dropping subscription: {err}",
            ctx.cluster()
        );
        ctx.evict_dependent(&dependent);
    })
}
