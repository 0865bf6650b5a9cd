//! Category discovery: enumerate the program's accounts of one category and
//! subscribe the ones not yet watched.

use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use super::EnvironmentContext;
use crate::adapters::{FailureCallback, UpdateCallback};
use crate::domain::{Address, Category, Payload, Record};
use crate::error::{MirrorError, Result};

/// Outcome of one discovery pass over a category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Accounts returned by the listing
    pub listed: usize,
    /// Accounts whose data could not be decoded
    pub undecodable: usize,
    /// Addresses newly added to the category set
    pub added: usize,
    /// Subscriptions installed
    pub subscribed: usize,
}

/// Run the discovery loop for one category.
///
/// The listing is taken in full before anything is applied, and the apply step
/// holds the membership lock so it cannot interleave with an eviction.
pub async fn discover_category(
    ctx: &Arc<EnvironmentContext>,
    category: Category,
) -> Result<DiscoveryReport> {
    let listing = ctx.program().list_all(category).await?;
    let mut report = DiscoveryReport {
        listed: listing.len(),
        ..DiscoveryReport::default()
    };

    let mut records: Vec<Record> = Vec::with_capacity(listing.len());
    for (address, raw) in &listing {
        match ctx.program().decode_record(category, address, raw) {
            Ok(record) => records.push(record),
            Err(e) => {
                report.undecodable += 1;
                debug!("{} {category} {address}: skipping undecodable account: {e}", ctx.cluster());
            }
        }
    }

    if records.is_empty() {
        return Ok(report);
    }

    let fetcher = ctx.fetcher();
    let mut membership = ctx.lock_membership();
    for record in records {
        let address = record.address();
        if membership.get_mut(category).insert(address) {
            report.added += 1;
        }
        if fetcher.contains(&address) {
            continue;
        }
        let installed = fetcher.add_program(
            category.kind(),
            address,
            Arc::clone(ctx.program()),
            Some(record.into_payload()),
            noop_update(),
            evict_on_failure(Arc::downgrade(ctx), category, address),
        );
        if installed {
            report.subscribed += 1;
        }
    }
    drop(membership);

    if report.added > 0 || report.subscribed > 0 {
        info!(
            "{} {category}: {} listed, {} new, {} subscribed",
            ctx.cluster(),
            report.listed,
            report.added,
            report.subscribed
        );
    }
    Ok(report)
}

/// Top-level records are served straight from the fetcher's cache.
fn noop_update() -> UpdateCallback {
    Arc::new(|_: &Payload| {})
}

fn evict_on_failure(ctx: Weak<EnvironmentContext>, category: Category, address: Address) -> FailureCallback {
    Arc::new(move |err: &MirrorError| {
        let Some(ctx) = ctx.upgrade() else {
            return;
        };
        warn!("{} {category} {address}: subscription failed, evicting: {err}", ctx.cluster());
        ctx.evict(category, &address);
    })
}
