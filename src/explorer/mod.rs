//! Block-explorer REST client
//!
//! Auxiliary lookups against an etherscan-style API, keyed by an API key
//! and a chain id: transactions, balances, contract ABIs, gas price.
//! Account/contract endpoints answer `{status, message, result}` with
//! status "1" on success; proxy endpoints answer bare `{result}` with
//! hex-encoded quantities. Non-success status surfaces the API's own
//! message. Nothing here is retried.

use crate::core::chain::explorer_api_url;
use crate::error::{NodeError, NodeResult};
use serde_json::Value;

pub struct ExplorerClient {
    http: reqwest::Client,
    api_key: String,
    default_chain_id: u64,
}

impl ExplorerClient {
    pub fn new(api_key: impl Into<String>, default_chain_id: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            default_chain_id,
        }
    }

    pub fn default_chain_id(&self) -> u64 {
        self.default_chain_id
    }

    /// Transaction details by hash (proxy lookup, raw result object).
    pub async fn transaction(&self, tx_hash: &str, chain_id: Option<u64>) -> NodeResult<Value> {
        let data = self
            .get(
                chain_id,
                &[
                    ("module", "proxy"),
                    ("action", "eth_getTransactionByHash"),
                    ("txhash", tx_hash),
                ],
            )
            .await?;
        Ok(data.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Transaction receipt by hash (proxy lookup, raw result object).
    pub async fn transaction_receipt(
        &self,
        tx_hash: &str,
        chain_id: Option<u64>,
    ) -> NodeResult<Value> {
        let data = self
            .get(
                chain_id,
                &[
                    ("module", "proxy"),
                    ("action", "eth_getTransactionReceipt"),
                    ("txhash", tx_hash),
                ],
            )
            .await?;
        Ok(data.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Native balance of an address, in wei.
    pub async fn address_balance(&self, address: &str, chain_id: Option<u64>) -> NodeResult<u128> {
        let data = self
            .get(
                chain_id,
                &[
                    ("module", "account"),
                    ("action", "balance"),
                    ("address", address),
                    ("tag", "latest"),
                ],
            )
            .await?;
        let result = parse_status_response(&data, "Failed to get balance")?;
        parse_wei_string(&result)
    }

    /// ERC-20 token balance of an address, in the token's base units.
    pub async fn token_balance(
        &self,
        address: &str,
        token_address: &str,
        chain_id: Option<u64>,
    ) -> NodeResult<u128> {
        let data = self
            .get(
                chain_id,
                &[
                    ("module", "account"),
                    ("action", "tokenbalance"),
                    ("contractaddress", token_address),
                    ("address", address),
                    ("tag", "latest"),
                ],
            )
            .await?;
        let result = parse_status_response(&data, "Failed to get token balance")?;
        parse_wei_string(&result)
    }

    /// Verified contract ABI, parsed from the API's JSON-string payload.
    pub async fn contract_abi(&self, address: &str, chain_id: Option<u64>) -> NodeResult<Value> {
        let data = self
            .get(
                chain_id,
                &[
                    ("module", "contract"),
                    ("action", "getabi"),
                    ("address", address),
                ],
            )
            .await?;
        let result = parse_status_response(&data, "Failed to get contract ABI")?;
        serde_json::from_str(&result).map_err(|e| NodeError::Explorer(e.to_string()))
    }

    /// Current gas price, in wei.
    pub async fn gas_price(&self, chain_id: Option<u64>) -> NodeResult<u128> {
        let data = self
            .get(chain_id, &[("module", "proxy"), ("action", "eth_gasPrice")])
            .await?;
        let result = data
            .get("result")
            .and_then(|v| v.as_str())
            .ok_or_else(|| NodeError::Explorer("Failed to get gas price".into()))?;
        parse_hex_quantity(result)
    }

    async fn get(&self, chain_id: Option<u64>, query: &[(&str, &str)]) -> NodeResult<Value> {
        let chain_id = chain_id.unwrap_or(self.default_chain_id);
        let url = format!("{}/api", explorer_api_url(chain_id));
        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| NodeError::Explorer(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| NodeError::Explorer(e.to_string()))
    }
}

/// Unwrap a `{status, message, result}` response, surfacing the API's
/// message when status is not "1".
fn parse_status_response(data: &Value, fallback: &str) -> NodeResult<String> {
    let status = data.get("status").and_then(|v| v.as_str()).unwrap_or("0");
    if status == "1" {
        return data
            .get("result")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| NodeError::Explorer(fallback.into()));
    }
    let message = data
        .get("message")
        .and_then(|v| v.as_str())
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback);
    Err(NodeError::Explorer(message.to_string()))
}

fn parse_wei_string(result: &str) -> NodeResult<u128> {
    result
        .parse()
        .map_err(|_| NodeError::Explorer(format!("malformed quantity: {result}")))
}

/// Parse a 0x-prefixed hex quantity (proxy endpoints).
fn parse_hex_quantity(result: &str) -> NodeResult<u128> {
    let digits = result.strip_prefix("0x").unwrap_or(result);
    u128::from_str_radix(digits, 16)
        .map_err(|_| NodeError::Explorer(format!("malformed quantity: {result}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_success_response() {
        let data = json!({"status": "1", "message": "OK", "result": "123450000000000000"});
        assert_eq!(
            parse_status_response(&data, "fallback").expect("result"),
            "123450000000000000"
        );
        assert_eq!(parse_wei_string("123450000000000000").expect("wei"), 123_450_000_000_000_000);
    }

    #[test]
    fn surfaces_api_message_on_failure() {
        let data = json!({"status": "0", "message": "Invalid API Key", "result": null});
        let err = parse_status_response(&data, "fallback").expect_err("error");
        assert_eq!(err.to_string(), "explorer: Invalid API Key");
    }

    #[test]
    fn falls_back_when_message_missing() {
        let data = json!({"status": "0", "result": null});
        let err = parse_status_response(&data, "Failed to get balance").expect_err("error");
        assert_eq!(err.to_string(), "explorer: Failed to get balance");
    }

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_hex_quantity("0x3b9aca00").expect("wei"), 1_000_000_000);
        assert!(parse_hex_quantity("0xzz").is_err());
    }
}
