use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};

use crate::error::RpcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// The cluster operations the action pipeline depends on.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize)
    -> Result<u64, RpcError>;

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, RpcError>;

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, RpcError>;

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError>;
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct BlockhashValue {
    blockhash: String,
    #[serde(rename = "lastValidBlockHeight")]
    last_valid_block_height: u64,
}

fn unwrap_response<T>(method: &'static str, response: RpcResponse<T>) -> Result<T, RpcError> {
    if let Some(err) = response.error {
        return Err(RpcError::Remote {
            method,
            code: err.code,
            message: err.message,
        });
    }
    response.result.ok_or(RpcError::Decode {
        method,
        reason: "missing result".to_string(),
    })
}

/// Solana JSON-RPC over HTTP.
pub struct HttpRpcClient {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpRpcClient {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        log::debug!("rpc {} id={}", method, id);

        let response: RpcResponse<T> = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| RpcError::Transport { method, source })?
            .json()
            .await
            .map_err(|source| RpcError::Transport { method, source })?;

        unwrap_response(method, response)
    }
}

#[async_trait]
impl ChainRpc for HttpRpcClient {
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, RpcError> {
        self.call("getMinimumBalanceForRentExemption", json!([data_len]))
            .await
    }

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, RpcError> {
        const METHOD: &str = "getLatestBlockhash";
        let response: WithContext<BlockhashValue> = self
            .call(METHOD, json!([{ "commitment": "finalized" }]))
            .await?;

        let blockhash = Hash::from_str(&response.value.blockhash).map_err(|e| RpcError::Decode {
            method: METHOD,
            reason: format!("invalid blockhash: {}", e),
        })?;

        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height: response.value.last_valid_block_height,
        })
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, RpcError> {
        let response: WithContext<Option<Value>> = self
            .call(
                "getAccountInfo",
                json!([address.to_string(), { "encoding": "base64", "commitment": "confirmed" }]),
            )
            .await?;
        Ok(response.value.is_some())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        const METHOD: &str = "sendTransaction";
        let wire = bincode::serialize(transaction).map_err(|e| RpcError::Decode {
            method: METHOD,
            reason: format!("failed to serialize transaction: {}", e),
        })?;

        let signature: String = self
            .call(
                METHOD,
                json!([
                    BASE64.encode(wire),
                    { "encoding": "base64", "preflightCommitment": "confirmed" }
                ]),
            )
            .await?;

        Signature::from_str(&signature).map_err(|e| RpcError::Decode {
            method: METHOD,
            reason: format!("invalid signature: {}", e),
        })
    }
}
