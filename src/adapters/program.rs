use std::sync::Arc;

use super::{AccountSource, RawAccount, RecordDecoder};
use crate::domain::{AccountKind, Address, Category, Payload, Record};
use crate::error::Result;

/// Handle on the prediction program for one cluster: enumerates accounts by
/// category and decodes their data.
#[derive(Clone)]
pub struct ProgramHandle {
    program_id: Address,
    owner: Address,
    source: Arc<dyn AccountSource>,
    decoder: Arc<dyn RecordDecoder>,
}

impl ProgramHandle {
    pub fn new(
        program_id: Address,
        owner: Address,
        source: Arc<dyn AccountSource>,
        decoder: Arc<dyn RecordDecoder>,
    ) -> Self {
        Self {
            program_id,
            owner,
            source,
            decoder,
        }
    }

    pub fn program_id(&self) -> Address {
        self.program_id
    }

    /// Identity the handle was built for
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Every account of `category` currently owned by the program
    pub async fn list_all(&self, category: Category) -> Result<Vec<(Address, RawAccount)>> {
        let discriminator = self.decoder.discriminator(category.kind());
        self.source
            .get_program_accounts(&self.program_id, &discriminator)
            .await
    }

    pub fn decode(&self, kind: AccountKind, address: &Address, account: &RawAccount) -> Result<Payload> {
        self.decoder.decode(kind, address, account)
    }

    pub fn decode_record(
        &self,
        category: Category,
        address: &Address,
        account: &RawAccount,
    ) -> Result<Record> {
        self.decoder.decode_record(category, address, account)
    }
}

impl std::fmt::Debug for ProgramHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramHandle")
            .field("program_id", &self.program_id)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
