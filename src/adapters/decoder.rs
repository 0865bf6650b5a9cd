//! Raw account → payload decoding for Anchor program accounts.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use sha2::{Digest, Sha256};

use super::RawAccount;
use crate::config::DecoderConfig;
use crate::domain::{
    AccountKind, Address, Category, Payload, Record, ROUND_HISTORY_FIELD,
    USER_PREDICTION_HISTORY_FIELD,
};
use crate::error::{MirrorError, Result};

pub const DISCRIMINATOR_LEN: usize = 8;

/// Turns raw account bytes into the payload served by the query API
pub trait RecordDecoder: Send + Sync {
    /// Leading bytes identifying an account of `kind`
    fn discriminator(&self, kind: AccountKind) -> [u8; DISCRIMINATOR_LEN];

    fn decode(&self, kind: AccountKind, address: &Address, account: &RawAccount) -> Result<Payload>;

    /// Decode a top-level record into its typed view
    fn decode_record(
        &self,
        category: Category,
        address: &Address,
        account: &RawAccount,
    ) -> Result<Record> {
        let payload = self.decode(category.kind(), address, account)?;
        Record::from_payload(category, *address, payload)
    }
}

/// Anchor account discriminator: first 8 bytes of `sha256("account:<Name>")`
pub fn anchor_discriminator(account_name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::digest(format!("account:{account_name}").as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// Decoder for the prediction program's Anchor accounts.
///
/// Account bodies are carried through as base64; only the game's two
/// dependent addresses are read out of the buffer.
#[derive(Debug, Clone)]
pub struct AnchorDecoder {
    round_history_offset: usize,
    user_prediction_history_offset: usize,
}

impl AnchorDecoder {
    pub fn new(cfg: &DecoderConfig) -> Self {
        Self {
            round_history_offset: cfg.game_round_history_offset,
            user_prediction_history_offset: cfg.game_user_prediction_history_offset,
        }
    }

    fn read_ref(&self, data: &[u8], offset: usize, field: &str) -> Result<Address> {
        Address::read_at(data, offset).ok_or_else(|| {
            MirrorError::Decode(format!(
                "game account too short for `{field}` at offset {offset} ({} bytes)",
                data.len()
            ))
        })
    }
}

impl Default for AnchorDecoder {
    fn default() -> Self {
        Self::new(&DecoderConfig::default())
    }
}

impl RecordDecoder for AnchorDecoder {
    fn discriminator(&self, kind: AccountKind) -> [u8; DISCRIMINATOR_LEN] {
        anchor_discriminator(kind.account_name())
    }

    fn decode(&self, kind: AccountKind, address: &Address, account: &RawAccount) -> Result<Payload> {
        let expected = self.discriminator(kind);
        let actual = account.data.get(..DISCRIMINATOR_LEN).ok_or_else(|| {
            MirrorError::Decode(format!("{address}: account data shorter than discriminator"))
        })?;
        if actual != expected {
            return Err(MirrorError::Decode(format!(
                "{address}: discriminator {} is not a {}",
                hex::encode(actual),
                kind.account_name()
            )));
        }

        let mut payload = json!({
            "address": address.to_string(),
            "kind": kind.as_str(),
            "owner": account.owner.to_string(),
            "lamports": account.lamports,
            "discriminator": hex::encode(expected),
            "data": STANDARD.encode(&account.data),
        });

        if kind == AccountKind::Game {
            let round_history =
                self.read_ref(&account.data, self.round_history_offset, ROUND_HISTORY_FIELD)?;
            let user_prediction_history = self.read_ref(
                &account.data,
                self.user_prediction_history_offset,
                USER_PREDICTION_HISTORY_FIELD,
            )?;
            payload[ROUND_HISTORY_FIELD] = json!(round_history.to_string());
            payload[USER_PREDICTION_HISTORY_FIELD] = json!(user_prediction_history.to_string());
        }

        Ok(payload)
    }
}
