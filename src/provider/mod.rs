//! Wallet provider seam - the injected wallet as a trait.
//!
//! The browser-injected wallet owns accounts, the chain identity, ABI
//! encoding, and transaction signing; this crate only consumes that
//! surface. `WalletProvider` models it: request/notify semantics plus
//! contract call/send keyed by method name, mirroring the collaborating
//! wallet API rather than re-implementing it.
//!
//! `MemoryProvider` is the in-process implementation backing the CLI demo
//! mode and the test suite.

mod memory;

pub use memory::MemoryProvider;

use crate::core::Address;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

/// Push notifications from the wallet.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// The wallet's account list changed (may be empty).
    AccountsChanged(Vec<Address>),
    /// The wallet switched chains.
    ChainChanged(u64),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("no wallet provider available")]
    Unavailable,
    #[error("user rejected the request")]
    Rejected,
    /// Contract revert or node-side call failure.
    #[error("call failed: {0}")]
    Call(String),
    #[error("transport: {0}")]
    Transport(String),
}

impl From<ProviderError> for crate::error::NodeError {
    fn from(e: ProviderError) -> Self {
        use crate::error::NodeError;
        match e {
            ProviderError::Unavailable => NodeError::WalletUnavailable(e.to_string()),
            ProviderError::Rejected => NodeError::Rejected,
            ProviderError::Call(msg) => NodeError::Contract(msg),
            ProviderError::Transport(msg) => NodeError::Contract(msg),
        }
    }
}

/// Confirmation result for a submitted transaction.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: String,
    /// false means the transaction was mined but reverted.
    pub status: bool,
    pub block_number: u64,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for account access. The first returned address is
    /// the active account.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Current chain identity.
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// Subscribe to accountsChanged / chainChanged notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;

    /// Read-only contract call. Args are ABI-level JSON values; the
    /// wallet side owns the encoding.
    async fn call(&self, to: &Address, method: &str, args: &[Value])
        -> Result<Value, ProviderError>;

    /// State-changing contract call from the active account, with
    /// `value_wei` attached for payable methods. Returns the tx hash.
    async fn send(
        &self,
        to: &Address,
        method: &str,
        args: &[Value],
        value_wei: u128,
    ) -> Result<String, ProviderError>;

    /// Native currency transfer from the active account.
    async fn transfer(&self, to: &Address, value_wei: u128) -> Result<String, ProviderError>;

    /// Block until the transaction is mined. No timeout is applied; a
    /// stalled confirmation stalls the caller.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, ProviderError>;
}
