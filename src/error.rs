//! Error taxonomy for the node.
//!
//! Probing reads swallow per-ID contract errors (absence semantics);
//! everything else propagates to the caller. Nothing is retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    /// No injected wallet is available for the attempted action.
    #[error("wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// The user rejected the wallet request. No state change.
    #[error("request rejected by user")]
    Rejected,

    /// An operation that needs a live session was called while disconnected.
    #[error("not connected")]
    NotConnected,

    #[error("config: {0}")]
    Config(String),

    #[error("Invalid recipient address")]
    InvalidAddress,

    #[error("Please enter a valid amount")]
    InvalidAmount,

    /// A write is already pending on this client. No queueing, fail fast.
    #[error("another write is already in flight")]
    WriteInFlight,

    /// Contract call or transaction failure on a write path.
    #[error("contract: {0}")]
    Contract(String),

    /// Explorer API failure, carrying the API's reported message.
    #[error("explorer: {0}")]
    Explorer(String),

    #[error("store: {0}")]
    Store(String),
}

impl From<std::io::Error> for NodeError {
    fn from(e: std::io::Error) -> Self {
        NodeError::Store(e.to_string())
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(e: serde_json::Error) -> Self {
        NodeError::Store(e.to_string())
    }
}

pub type NodeResult<T> = Result<T, NodeError>;
