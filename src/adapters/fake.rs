//! In-memory `AccountSource` for unit tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{AccountSource, RawAccount};
use crate::domain::Address;
use crate::error::{MirrorError, Result};

#[derive(Default)]
pub(crate) struct FakeSource {
    accounts: Mutex<BTreeMap<Address, RawAccount>>,
    fail_listing: AtomicBool,
    fail_reads: AtomicBool,
    listings: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn insert(&self, address: Address, account: RawAccount) {
        self.accounts.lock().unwrap().insert(address, account);
    }

    pub(crate) fn remove(&self, address: &Address) {
        self.accounts.lock().unwrap().remove(address);
    }

    pub(crate) fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountSource for FakeSource {
    async fn get_multiple_accounts(&self, addresses: &[Address]) -> Result<Vec<Option<RawAccount>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(MirrorError::Rpc {
                code: -32000,
                message: "node unavailable".to_string(),
            });
        }
        let accounts = self.accounts.lock().unwrap();
        Ok(addresses.iter().map(|a| accounts.get(a).cloned()).collect())
    }

    async fn get_program_accounts(
        &self,
        _program: &Address,
        discriminator: &[u8],
    ) -> Result<Vec<(Address, RawAccount)>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(MirrorError::Rpc {
                code: -32000,
                message: "node unavailable".to_string(),
            });
        }
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .iter()
            .filter(|(_, account)| account.data.starts_with(discriminator))
            .map(|(address, account)| (*address, account.clone()))
            .collect())
    }
}
