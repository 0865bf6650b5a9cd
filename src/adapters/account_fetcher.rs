//! Polling account fetcher.
//!
//! Holds the table of subscribed addresses and their last known payload, polls
//! the cluster on a fixed cadence and reports each account's outcome to the
//! callbacks registered with it.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::{AccountSource, ProgramHandle, RawAccount};
use crate::config::FetcherConfig;
use crate::domain::{AccountKind, Address, Payload};
use crate::error::MirrorError;
use crate::supervisor::{supervise, RestartPolicy};

/// Called with the freshly decoded payload when an account changes
pub type UpdateCallback = Arc<dyn Fn(&Payload) + Send + Sync>;
/// Called when an account disappears or can no longer be decoded
pub type FailureCallback = Arc<dyn Fn(&MirrorError) + Send + Sync>;

struct Subscription {
    kind: AccountKind,
    program: Arc<ProgramHandle>,
    data: Option<Payload>,
    on_update: UpdateCallback,
    on_failure: FailureCallback,
}

pub struct AccountFetcher {
    source: Arc<dyn AccountSource>,
    accounts: DashMap<Address, Subscription>,
    cfg: FetcherConfig,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl AccountFetcher {
    pub fn new(source: Arc<dyn AccountSource>, cfg: FetcherConfig) -> Self {
        Self {
            source,
            accounts: DashMap::new(),
            cfg,
            poll_task: Mutex::new(None),
        }
    }

    /// Spawn the polling loop under supervision; a panicking callback restarts
    /// the loop according to `policy`. Calling it again while running is a
    /// no-op.
    pub fn start(self: &Arc<Self>, policy: RestartPolicy) {
        let mut slot = self.poll_task.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let fetcher = Arc::clone(self);
        let interval = Duration::from_millis(self.cfg.poll_interval_ms);
        info!(
            "AccountFetcher: starting (interval={}ms, batch={}, concurrency={})",
            self.cfg.poll_interval_ms, self.cfg.batch_size, self.cfg.max_concurrency
        );
        *slot = Some(tokio::spawn(async move {
            supervise("account-fetcher", policy, move || {
                Arc::clone(&fetcher).poll_loop(interval)
            })
            .await;
        }));
    }

    async fn poll_loop(self: Arc<Self>, interval: Duration) {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    /// Stop polling; subscriptions and cached data are kept.
    pub fn stop(&self) {
        let mut slot = self.poll_task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Install a subscription for `address`. Returns false if the address
    /// already has one; the existing subscription is left as is.
    pub fn add_program(
        &self,
        kind: AccountKind,
        address: Address,
        program: Arc<ProgramHandle>,
        initial: Option<Payload>,
        on_update: UpdateCallback,
        on_failure: FailureCallback,
    ) -> bool {
        match self.accounts.entry(address) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Subscription {
                    kind,
                    program,
                    data: initial,
                    on_update,
                    on_failure,
                });
                debug!("AccountFetcher: subscribed {kind} {address}");
                true
            }
        }
    }

    /// Drop the subscription for `address`
    pub fn remove(&self, address: &Address) -> bool {
        self.accounts.remove(address).is_some()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    /// Last known payload, `None` if unsubscribed or not fetched yet
    pub fn data(&self, address: &Address) -> Option<Payload> {
        self.accounts.get(address).and_then(|s| s.data.clone())
    }

    pub fn kind(&self, address: &Address) -> Option<AccountKind> {
        self.accounts.get(address).map(|s| s.kind)
    }

    /// Cached payloads of every subscription of `kind` that has data, ordered
    /// by address
    pub fn payloads(&self, kind: AccountKind) -> Vec<(Address, Payload)> {
        let mut out: Vec<(Address, Payload)> = self
            .accounts
            .iter()
            .filter(|s| s.kind == kind)
            .filter_map(|s| s.data.clone().map(|data| (*s.key(), data)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Fetch every subscribed account once and dispatch the callbacks.
    pub async fn poll_once(&self) {
        let addresses: Vec<Address> = self.accounts.iter().map(|s| *s.key()).collect();
        if addresses.is_empty() {
            return;
        }

        let batch_size = self.cfg.batch_size.max(1);
        let batches: Vec<Vec<Address>> = addresses.chunks(batch_size).map(<[Address]>::to_vec).collect();
        let results: Vec<_> = stream::iter(batches)
            .map(|batch| async move {
                let result = self.source.get_multiple_accounts(&batch).await;
                (batch, result)
            })
            .buffer_unordered(self.cfg.max_concurrency.max(1))
            .collect()
            .await;

        for (batch, result) in results {
            match result {
                Ok(accounts) if accounts.len() == batch.len() => {
                    for (address, account) in batch.into_iter().zip(accounts) {
                        self.deliver(address, account);
                    }
                }
                Ok(accounts) => warn!(
                    "AccountFetcher: expected {} accounts, got {}; skipping batch",
                    batch.len(),
                    accounts.len()
                ),
                Err(e) if e.is_transient() => {
                    warn!("AccountFetcher: batch of {} failed, retrying next poll: {e}", batch.len())
                }
                Err(e) => error!("AccountFetcher: batch of {} failed: {e}", batch.len()),
            }
        }
    }

    fn deliver(&self, address: Address, account: Option<RawAccount>) {
        // Subscription may have been evicted while the batch was in flight.
        let Some(sub) = self.accounts.get(&address) else {
            return;
        };
        let kind = sub.kind;
        let program = Arc::clone(&sub.program);
        let on_update = Arc::clone(&sub.on_update);
        let on_failure = Arc::clone(&sub.on_failure);
        drop(sub);

        let decoded = match account {
            Some(raw) => program.decode(kind, &address, &raw),
            None => Err(MirrorError::AccountNotFound(address.to_string())),
        };

        match decoded {
            Ok(payload) => {
                let changed = match self.accounts.get_mut(&address) {
                    Some(mut sub) if sub.data.as_ref() != Some(&payload) => {
                        sub.data = Some(payload.clone());
                        true
                    }
                    _ => false,
                };
                if changed {
                    on_update(&payload);
                }
            }
            Err(e) => {
                debug!("AccountFetcher: {kind} {address} failed: {e}");
                on_failure(&e);
            }
        }
    }
}

impl Drop for AccountFetcher {
    fn drop(&mut self) {
        self.stop();
    }
}
