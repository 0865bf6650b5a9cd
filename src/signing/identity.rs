use ed25519_dalek::SigningKey;
use tracing::info;
use zeroize::{Zeroize, Zeroizing};

use crate::domain::Address;
use crate::error::{MirrorError, Result};

/// Environment variable holding the owner keypair
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

const KEYPAIR_LEN: usize = 64;

/// Signing identity the program handles are built with.
///
/// The mirror never signs anything; the identity is validated at startup so a
/// broken credential stops the process before it serves.
#[derive(Clone)]
pub struct Identity {
    signing_key: SigningKey,
}

impl Identity {
    /// Parse a 64-byte keypair given either as a base58 string (wallet export)
    /// or as a JSON byte array (keygen file contents).
    pub fn from_secret(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        let mut bytes = match decode_base58(secret).or_else(|| decode_json_array(secret)) {
            Some(bytes) => bytes,
            None => {
                return Err(MirrorError::Credential(
                    "failed to parse private key as a JSON byte array or a base58 string"
                        .to_string(),
                ))
            }
        };

        let keypair: Zeroizing<[u8; KEYPAIR_LEN]> = match bytes.as_slice().try_into() {
            Ok(array) => Zeroizing::new(array),
            Err(_) => {
                let len = bytes.len();
                bytes.zeroize();
                return Err(MirrorError::Credential(format!(
                    "keypair must be {KEYPAIR_LEN} bytes, got {len}"
                )));
            }
        };
        bytes.zeroize();

        let signing_key = SigningKey::from_keypair_bytes(&keypair)
            .map_err(|e| MirrorError::Credential(format!("invalid keypair: {e}")))?;

        let identity = Self { signing_key };
        info!("Identity loaded: {}", identity.address());
        Ok(identity)
    }

    /// Load the keypair from the `PRIVATE_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        let mut secret = std::env::var(PRIVATE_KEY_ENV).map_err(|_| {
            MirrorError::Credential(format!("need a {PRIVATE_KEY_ENV} env variable"))
        })?;

        let result = Self::from_secret(&secret);
        secret.zeroize();
        result
    }

    /// Public key of the identity
    pub fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

fn decode_base58(secret: &str) -> Option<Vec<u8>> {
    bs58::decode(secret).into_vec().ok()
}

fn decode_json_array(secret: &str) -> Option<Vec<u8>> {
    serde_json::from_str::<Vec<u8>>(secret).ok()
}
