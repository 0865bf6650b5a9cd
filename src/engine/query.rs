//! Read-only projections of an environment's mirrored state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::EnvironmentContext;
use crate::domain::{Category, Cluster, HistoryEntry, Payload};

/// Cached payloads of every subscribed `category` account that has data.
/// Entries not fetched yet, or evicted, are simply absent.
pub fn category_payloads(ctx: &EnvironmentContext, category: Category) -> Vec<Payload> {
    ctx.fetcher()
        .payloads(category.kind())
        .into_iter()
        .map(|(_, payload)| payload)
        .collect()
}

/// Every history entry, keyed by the game's base58 address
pub fn histories(ctx: &EnvironmentContext) -> BTreeMap<String, HistoryEntry> {
    ctx.histories()
        .into_iter()
        .map(|(game, entry)| (game.to_string(), entry))
        .collect()
}

/// Counters describing one environment
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentStats {
    pub cluster: Cluster,
    pub vaults: usize,
    pub rounds: usize,
    pub games: usize,
    pub histories: usize,
    pub subscriptions: usize,
    pub ticks_completed: u64,
    pub ticks_skipped: u64,
    pub last_tick: Option<DateTime<Utc>>,
}

pub fn stats(ctx: &EnvironmentContext) -> EnvironmentStats {
    let (vaults, rounds, games) = {
        let membership = ctx.lock_membership();
        (
            membership.get(Category::Vault).len(),
            membership.get(Category::Round).len(),
            membership.get(Category::Game).len(),
        )
    };
    EnvironmentStats {
        cluster: ctx.cluster(),
        vaults,
        rounds,
        games,
        histories: ctx.history_count(),
        subscriptions: ctx.fetcher().len(),
        ticks_completed: ctx.ticks_completed(),
        ticks_skipped: ctx.ticks_skipped(),
        last_tick: ctx.last_tick(),
    }
}
