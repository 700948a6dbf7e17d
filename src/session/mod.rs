//! Session manager - wallet connection lifecycle
//!
//! Owns `{account, chain_id, connected}` with a single writer: the
//! connect/disconnect methods and the listener task that consumes wallet
//! notifications. Everyone else reads snapshots.
//!
//! A chain change does not try to patch downstream state. It updates the
//! chain id and broadcasts `ReloadRequired` so every contract binding is
//! rebuilt against the new chain, a hard reset rather than a soft
//! transition over a stale provider.

use crate::core::Address;
use crate::error::{NodeError, NodeResult};
use crate::provider::{ProviderEvent, WalletProvider};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// The client's current view of wallet connectivity.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub connected: bool,
}

/// Session lifecycle notifications.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The wallet switched to a different account.
    AccountChanged(Address),
    /// The session ended (explicit disconnect or empty account list).
    Disconnected,
    /// The chain changed; all contract bindings must be rebuilt.
    ReloadRequired(u64),
}

pub struct SessionManager {
    provider: Arc<dyn WalletProvider>,
    state: Arc<RwLock<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Create the manager and spawn its notification listener. The
    /// listener runs for the manager's lifetime; events received while
    /// disconnected are ignored.
    pub fn new(provider: Arc<dyn WalletProvider>) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        let manager = Arc::new(Self {
            provider: provider.clone(),
            state: Arc::new(RwLock::new(Session::default())),
            events,
        });

        let state = manager.state.clone();
        let sender = manager.events.clone();
        let mut notifications = provider.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = notifications.recv().await {
                match event {
                    ProviderEvent::AccountsChanged(accounts) => {
                        let mut session = state.write().await;
                        if !session.connected {
                            continue;
                        }
                        match accounts.into_iter().next() {
                            Some(account) => {
                                info!(account = %account.short(), "wallet switched accounts");
                                session.account = Some(account.clone());
                                let _ = sender.send(SessionEvent::AccountChanged(account));
                            }
                            None => {
                                info!("wallet reported no accounts, disconnecting");
                                *session = Session::default();
                                let _ = sender.send(SessionEvent::Disconnected);
                            }
                        }
                    }
                    ProviderEvent::ChainChanged(chain_id) => {
                        let mut session = state.write().await;
                        if !session.connected {
                            continue;
                        }
                        info!(chain_id, "chain changed, reload required");
                        session.chain_id = Some(chain_id);
                        let _ = sender.send(SessionEvent::ReloadRequired(chain_id));
                    }
                }
            }
            debug!("wallet notification stream closed");
        });

        manager
    }

    /// Request account access from the wallet. On success the first
    /// returned address becomes the active account and the chain id is
    /// read fresh. On failure state is left unchanged; there is no
    /// automatic retry.
    pub async fn connect(&self) -> NodeResult<Session> {
        let accounts = match self.provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(error = %e, "wallet connect failed");
                return Err(e.into());
            }
        };
        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| NodeError::WalletUnavailable("wallet returned no accounts".into()))?;
        let chain_id = self.provider.chain_id().await?;

        let mut session = self.state.write().await;
        session.account = Some(account.clone());
        session.chain_id = Some(chain_id);
        session.connected = true;
        info!(account = %account.short(), chain_id, "wallet connected");
        Ok(session.clone())
    }

    /// Clear the session. Purely local: wallets cannot be force-disconnected.
    pub async fn disconnect(&self) {
        let mut session = self.state.write().await;
        *session = Session::default();
        info!("wallet disconnected");
        let _ = self.events.send(SessionEvent::Disconnected);
    }

    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    pub async fn chain_id(&self) -> Option<u64> {
        self.state.read().await.chain_id
    }

    /// The active account, or `NotConnected` for callers that need one.
    pub async fn account(&self) -> NodeResult<Address> {
        self.state
            .read()
            .await
            .account
            .clone()
            .ok_or(NodeError::NotConnected)
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
