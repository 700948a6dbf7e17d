//! Staking contract client: stake, withdraw, position lookup.

use super::tx::{WriteGate, WriteState};
use super::StakeInfo;
use crate::core::{parse_eth_amount, Address};
use crate::error::{NodeError, NodeResult};
use crate::provider::{TxReceipt, WalletProvider};
use crate::session::SessionManager;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub struct StakingClient {
    provider: Arc<dyn WalletProvider>,
    session: Arc<SessionManager>,
    address: Address,
    gate: WriteGate,
}

impl StakingClient {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        session: Arc<SessionManager>,
        address: Address,
    ) -> Self {
        Self {
            provider,
            session,
            address,
            gate: WriteGate::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn write_state(&self) -> WriteState {
        self.gate.state()
    }

    /// Lock the given amount in the staking contract.
    pub async fn stake(&self, amount_eth: &str) -> NodeResult<TxReceipt> {
        let amount_wei = parse_eth_amount(amount_eth)?;
        self.submit("stake", vec![], amount_wei).await
    }

    /// Withdraw the full staked amount plus accrued rewards.
    pub async fn withdraw(&self) -> NodeResult<TxReceipt> {
        self.submit("withdraw", vec![], 0).await
    }

    pub async fn stake_info(&self, account: &Address) -> NodeResult<StakeInfo> {
        if !self.session.is_connected().await {
            return Err(NodeError::NotConnected);
        }
        let value = self
            .provider
            .call(&self.address, "getStakeInfo", &[json!(account.as_str())])
            .await?;
        decode_stake_info(&value)
            .ok_or_else(|| NodeError::Contract("malformed stake info".into()))
    }

    async fn submit(
        &self,
        method: &str,
        args: Vec<Value>,
        value_wei: u128,
    ) -> NodeResult<TxReceipt> {
        self.session.account().await?;
        self.gate.begin()?;
        let result = self.submit_inner(method, &args, value_wei).await;
        self.gate.settle(result.is_ok());
        result
    }

    async fn submit_inner(
        &self,
        method: &str,
        args: &[Value],
        value_wei: u128,
    ) -> NodeResult<TxReceipt> {
        let tx_hash = self
            .provider
            .send(&self.address, method, args, value_wei)
            .await?;
        self.gate.confirming();
        debug!(method, %tx_hash, "awaiting confirmation");
        let receipt = self.provider.wait_for_receipt(&tx_hash).await?;
        if !receipt.status {
            return Err(NodeError::Contract(format!(
                "transaction {} reverted",
                receipt.tx_hash
            )));
        }
        Ok(receipt)
    }
}

fn decode_stake_info(value: &Value) -> Option<StakeInfo> {
    Some(StakeInfo {
        amount_wei: value.get("amount")?.as_str()?.parse().ok()?,
        timestamp: value.get("timestamp")?.as_u64()?,
        rewards_wei: value.get("rewards")?.as_str()?.parse().ok()?,
        active: value.get("active")?.as_bool()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_stake_info() {
        let value = json!({
            "amount": "1500000000000000000",
            "timestamp": 1_700_000_000,
            "rewards": "30000000000000000",
            "active": true,
        });
        let info = decode_stake_info(&value).expect("stake info");
        assert_eq!(info.amount_wei, 1_500_000_000_000_000_000);
        assert_eq!(info.rewards_wei, 30_000_000_000_000_000);
        assert!(info.active);
    }

    #[test]
    fn decode_rejects_malformed_info() {
        assert!(decode_stake_info(&json!({"amount": 5})).is_none());
    }
}
