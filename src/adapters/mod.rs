pub mod account_fetcher;
pub mod decoder;
#[cfg(test)]
pub(crate) mod fake;
pub mod program;
pub mod solana_rpc;

use async_trait::async_trait;

use crate::domain::Address;
use crate::error::Result;

pub use account_fetcher::{AccountFetcher, FailureCallback, UpdateCallback};
pub use decoder::{anchor_discriminator, AnchorDecoder, RecordDecoder};
pub use program::ProgramHandle;
pub use solana_rpc::SolanaRpcClient;

/// Account as returned by the cluster, before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    pub lamports: u64,
    pub owner: Address,
    pub data: Vec<u8>,
}

/// Read access to on-chain accounts (the cluster connection)
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Fetch accounts by address; `None` for accounts that do not exist.
    /// The result has one slot per requested address, in order.
    async fn get_multiple_accounts(&self, addresses: &[Address]) -> Result<Vec<Option<RawAccount>>>;

    /// Enumerate every account owned by `program` whose data starts with
    /// `discriminator`.
    async fn get_program_accounts(
        &self,
        program: &Address,
        discriminator: &[u8],
    ) -> Result<Vec<(Address, RawAccount)>>;
}
