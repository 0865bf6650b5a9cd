//! Minimal Solana JSON-RPC client for the two read calls the mirror needs.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::{AccountSource, RawAccount};
use crate::domain::Address;
use crate::error::{MirrorError, Result};

const COMMITMENT: &str = "confirmed";

/// JSON-RPC client for a single cluster endpoint
pub struct SolanaRpcClient {
    http: Client,
    endpoint: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct UiAccount {
    lamports: u64,
    owner: String,
    /// `[base64_data, "base64"]`
    data: (String, String),
}

#[derive(Debug, Deserialize)]
struct KeyedUiAccount {
    pubkey: String,
    account: UiAccount,
}

impl SolanaRpcClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "rpc request");
        let response: RpcResponse<T> = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(MirrorError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        response.result.ok_or_else(|| MirrorError::Rpc {
            code: 0,
            message: format!("{method}: empty result"),
        })
    }
}

impl UiAccount {
    fn into_raw(self) -> Result<RawAccount> {
        let (encoded, encoding) = self.data;
        if encoding != "base64" {
            return Err(MirrorError::Decode(format!(
                "unexpected account encoding {encoding}"
            )));
        }
        let data = STANDARD
            .decode(encoded)
            .map_err(|e| MirrorError::Decode(format!("invalid base64 account data: {e}")))?;
        Ok(RawAccount {
            lamports: self.lamports,
            owner: self.owner.parse()?,
            data,
        })
    }
}

#[async_trait]
impl AccountSource for SolanaRpcClient {
    async fn get_multiple_accounts(&self, addresses: &[Address]) -> Result<Vec<Option<RawAccount>>> {
        let keys: Vec<String> = addresses.iter().map(Address::to_base58).collect();
        let params = json!([keys, { "encoding": "base64", "commitment": COMMITMENT }]);
        let response: WithContext<Vec<Option<UiAccount>>> =
            self.call("getMultipleAccounts", params).await?;

        response
            .value
            .into_iter()
            .map(|account| account.map(UiAccount::into_raw).transpose())
            .collect()
    }

    async fn get_program_accounts(
        &self,
        program: &Address,
        discriminator: &[u8],
    ) -> Result<Vec<(Address, RawAccount)>> {
        let params = json!([
            program.to_base58(),
            {
                "encoding": "base64",
                "commitment": COMMITMENT,
                "filters": [
                    { "memcmp": { "offset": 0, "bytes": bs58::encode(discriminator).into_string() } }
                ]
            }
        ]);
        let accounts: Vec<KeyedUiAccount> = self.call("getProgramAccounts", params).await?;

        accounts
            .into_iter()
            .map(|keyed| Ok((keyed.pubkey.parse()?, keyed.account.into_raw()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_accounts_response() {
        let raw = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "context": { "slot": 1 },
                "value": [
                    null,
                    {
                        "data": [STANDARD.encode([1u8, 2, 3]), "base64"],
                        "executable": false,
                        "lamports": 42,
                        "owner": "11111111111111111111111111111111",
                        "rentEpoch": 0,
                        "space": 3
                    }
                ]
            }
        });
        let parsed: RpcResponse<WithContext<Vec<Option<UiAccount>>>> =
            serde_json::from_value(raw).unwrap();
        let accounts: Vec<Option<RawAccount>> = parsed
            .result
            .unwrap()
            .value
            .into_iter()
            .map(|a| a.map(UiAccount::into_raw).transpose())
            .collect::<Result<_>>()
            .unwrap();
        assert!(accounts[0].is_none());
        let account = accounts[1].as_ref().unwrap();
        assert_eq!(account.lamports, 42);
        assert_eq!(account.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_rpc_error() {
        let raw = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid params" }
        });
        let parsed: RpcResponse<Value> = serde_json::from_value(raw).unwrap();
        let err = parsed.error.unwrap();
        assert_eq!(err.code, -32602);
        assert!(parsed.result.is_none());
    }

    #[test]
    fn test_rejects_non_base64_encoding() {
        let account = UiAccount {
            lamports: 1,
            owner: "11111111111111111111111111111111".to_string(),
            data: ("abc".to_string(), "jsonParsed".to_string()),
        };
        assert!(matches!(account.into_raw(), Err(MirrorError::Decode(_))));
    }
}
