//! Per-environment mirror state.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adapters::{AccountFetcher, ProgramHandle};
use crate::domain::{AccountKind, Address, Category, Cluster, HistoryEntry, Payload};
use crate::error::{MirrorError, Result};

/// Known addresses per category
#[derive(Debug, Default)]
pub struct CategorySets {
    vaults: HashSet<Address>,
    rounds: HashSet<Address>,
    games: HashSet<Address>,
}

impl CategorySets {
    pub fn get(&self, category: Category) -> &HashSet<Address> {
        match category {
            Category::Vault => &self.vaults,
            Category::Round => &self.rounds,
            Category::Game => &self.games,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut HashSet<Address> {
        match category {
            Category::Vault => &mut self.vaults,
            Category::Round => &mut self.rounds,
            Category::Game => &mut self.games,
        }
    }
}

/// Everything one cluster's mirror owns: the fetcher, the category sets and the
/// per-game history entries.
///
/// Compound mutations touching both a category set and the fetcher table go
/// through the membership lock so a discovery pass and a failure callback
/// cannot interleave. The lock is never held across an await.
pub struct EnvironmentContext {
    cluster: Cluster,
    program: Arc<ProgramHandle>,
    fetcher: Arc<AccountFetcher>,
    membership: Mutex<CategorySets>,
    histories: DashMap<Address, HistoryEntry>,
    ticking: AtomicBool,
    ticks_completed: AtomicU64,
    ticks_skipped: AtomicU64,
    last_tick: Mutex<Option<DateTime<Utc>>>,
}

impl EnvironmentContext {
    pub fn new(cluster: Cluster, program: Arc<ProgramHandle>, fetcher: Arc<AccountFetcher>) -> Self {
        Self {
            cluster,
            program,
            fetcher,
            membership: Mutex::new(CategorySets::default()),
            histories: DashMap::new(),
            ticking: AtomicBool::new(false),
            ticks_completed: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            last_tick: Mutex::new(None),
        }
    }

    pub fn cluster(&self) -> Cluster {
        self.cluster
    }

    pub fn program(&self) -> &Arc<ProgramHandle> {
        &self.program
    }

    pub fn fetcher(&self) -> &Arc<AccountFetcher> {
        &self.fetcher
    }

    pub(crate) fn lock_membership(&self) -> MutexGuard<'_, CategorySets> {
        self.membership.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the addresses currently known for `category`
    pub fn members(&self, category: Category) -> Vec<Address> {
        let mut out: Vec<Address> = self.lock_membership().get(category).iter().copied().collect();
        out.sort();
        out
    }

    pub fn is_member(&self, category: Category, address: &Address) -> bool {
        self.lock_membership().get(category).contains(address)
    }

    /// Drop `address` from both the fetcher table and its category set.
    pub fn evict(&self, category: Category, address: &Address) {
        let mut membership = self.lock_membership();
        self.fetcher.remove(address);
        membership.get_mut(category).remove(address);
    }

    /// Drop a dependent subscription; the owning game is left alone.
    pub fn evict_dependent(&self, address: &Address) {
        self.fetcher.remove(address);
    }

    /// Write one dependent payload into the game's history entry, creating it
    /// if needed. Returns false for non-history kinds.
    pub fn merge_history(&self, game: Address, kind: AccountKind, payload: Payload) -> bool {
        if !matches!(kind, AccountKind::RoundHistory | AccountKind::UserPredictionHistory) {
            return false;
        }
        self.histories.entry(game).or_default().merge(kind, payload)
    }

    pub fn history(&self, game: &Address) -> Option<HistoryEntry> {
        self.histories.get(game).map(|e| e.value().clone())
    }

    /// All history entries keyed by game address
    pub fn histories(&self) -> BTreeMap<Address, HistoryEntry> {
        self.histories
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect()
    }

    pub fn history_count(&self) -> usize {
        self.histories.len()
    }

    /// Claim the tick slot; `None` if a tick is already running.
    pub fn try_begin_tick(&self) -> Option<TickGuard<'_>> {
        self.ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickGuard { ctx: self })
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::Acquire)
    }

    pub(crate) fn record_tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tick_completed(&self) {
        self.ticks_completed.fetch_add(1, Ordering::Relaxed);
        *self.last_tick.lock().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
    }

    pub fn ticks_completed(&self) -> u64 {
        self.ticks_completed.load(Ordering::Relaxed)
    }

    pub fn ticks_skipped(&self) -> u64 {
        self.ticks_skipped.load(Ordering::Relaxed)
    }

    pub fn last_tick(&self) -> Option<DateTime<Utc>> {
        *self.last_tick.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for EnvironmentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentContext")
            .field("cluster", &self.cluster)
            .field("program", &self.program)
            .field("subscriptions", &self.fetcher.len())
            .field("histories", &self.histories.len())
            .finish_non_exhaustive()
    }
}

/// Releases the tick slot on drop, including when the tick panics or its task
/// is aborted.
pub struct TickGuard<'a> {
    ctx: &'a EnvironmentContext,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.ctx.ticking.store(false, Ordering::Release);
    }
}

/// The isolated environments served by this process
#[derive(Debug, Clone, Default)]
pub struct Environments {
    contexts: BTreeMap<Cluster, Arc<EnvironmentContext>>,
}

impl Environments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ctx: Arc<EnvironmentContext>) {
        self.contexts.insert(ctx.cluster(), ctx);
    }

    pub fn get(&self, cluster: Cluster) -> Option<&Arc<EnvironmentContext>> {
        self.contexts.get(&cluster)
    }

    /// Look an environment up by its request name
    pub fn resolve(&self, name: &str) -> Result<&Arc<EnvironmentContext>> {
        let cluster: Cluster = name.parse()?;
        self.get(cluster)
            .ok_or_else(|| MirrorError::UnknownCluster(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<EnvironmentContext>> {
        self.contexts.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::context;
    use serde_json::json;

    #[test]
    fn test_debug_names_cluster() {
        let (_, ctx) = context(Cluster::Mainnet);
        let out = format!("{ctx:?}");
        assert!(out.starts_with("EnvironmentContext"));
        assert!(out.contains("Mainnet"));
    }

    #[test]
    fn test_tick_guard_is_exclusive() {
        let (_, ctx) = context(Cluster::Devnet);
        let guard = ctx.try_begin_tick();
        assert!(guard.is_some());
        assert!(ctx.is_ticking());
        assert!(ctx.try_begin_tick().is_none());
        drop(guard);
        assert!(!ctx.is_ticking());
        assert!(ctx.try_begin_tick().is_some());
    }

    #[test]
    fn test_merge_history_rejects_top_level_kinds() {
        let (_, ctx) = context(Cluster::Devnet);
        let game = Address::new([1u8; 32]);
        assert!(!ctx.merge_history(game, AccountKind::Vault, json!(1)));
        assert_eq!(ctx.history_count(), 0);
        assert!(ctx.merge_history(game, AccountKind::RoundHistory, json!(1)));
        assert_eq!(ctx.history(&game).unwrap().round_history, Some(json!(1)));
    }

    #[test]
    fn test_resolve_unknown_and_unconfigured() {
        let (_, devnet) = context(Cluster::Devnet);
        let mut envs = Environments::new();
        envs.insert(devnet);

        assert!(envs.resolve("devnet").is_ok());
        assert!(matches!(envs.resolve("foo"), Err(MirrorError::UnknownCluster(_))));
        assert!(matches!(envs.resolve("mainnet"), Err(MirrorError::UnknownCluster(_))));
    }
}
