//! Node - one handle over session, contracts, explorer, and local store
//!
//! The node owns the session manager and the contract clients built on
//! it. When the session reports a chain change the cached contract reads
//! are dropped, so every downstream consumer rebuilds its view against
//! the new chain instead of patching stale state.

mod config;

pub use config::{NodeConfig, DEFAULT_APPOINTMENTS_ADDRESS, DEFAULT_STAKING_ADDRESS};

use crate::contracts::{AppointmentsClient, StakingClient, WriteGate, WriteState};
use crate::core::{parse_eth_amount, Address};
use crate::error::{NodeError, NodeResult};
use crate::explorer::ExplorerClient;
use crate::provider::{TxReceipt, WalletProvider};
use crate::session::{Session, SessionEvent, SessionManager};
use crate::store::LocalAppointmentStore;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Node {
    config: NodeConfig,
    provider: Arc<dyn WalletProvider>,
    session: Arc<SessionManager>,
    appointments: Arc<AppointmentsClient>,
    staking: Arc<StakingClient>,
    explorer: ExplorerClient,
    store: LocalAppointmentStore,
    transfer_gate: WriteGate,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node").finish_non_exhaustive()
    }
}

impl Node {
    /// Wire up a node over the given wallet provider. Contract addresses
    /// come from the config; a bad address is a config error, caught here
    /// rather than on first use.
    pub fn from_config(
        config: NodeConfig,
        provider: Arc<dyn WalletProvider>,
    ) -> NodeResult<Self> {
        let appointments_address = Address::parse(&config.appointments_address)
            .map_err(|_| NodeError::Config(format!(
                "bad appointments address: {}",
                config.appointments_address
            )))?;
        let staking_address = Address::parse(&config.staking_address).map_err(|_| {
            NodeError::Config(format!("bad staking address: {}", config.staking_address))
        })?;

        let session = SessionManager::new(provider.clone());
        let appointments = Arc::new(AppointmentsClient::new(
            provider.clone(),
            session.clone(),
            appointments_address,
        ));
        let staking = Arc::new(StakingClient::new(
            provider.clone(),
            session.clone(),
            staking_address,
        ));
        let explorer = ExplorerClient::new(
            config.etherscan_api_key.clone().unwrap_or_default(),
            config.chain_id,
        );
        let store = LocalAppointmentStore::open(config.appointments_file());

        // Rebuild contract state on chain change: drop cached reads so the
        // next list call scans the new chain.
        let mut events = session.events();
        let reload_appointments = appointments.clone();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if let SessionEvent::ReloadRequired(chain_id) = event {
                    info!(chain_id, "rebuilding contract bindings");
                    reload_appointments.clear_cache().await;
                }
            }
            debug!("session event stream closed");
        });

        Ok(Self {
            config,
            provider,
            session,
            appointments,
            staking,
            explorer,
            store,
            transfer_gate: WriteGate::new(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn appointments(&self) -> &Arc<AppointmentsClient> {
        &self.appointments
    }

    pub fn staking(&self) -> &Arc<StakingClient> {
        &self.staking
    }

    pub fn explorer(&self) -> &ExplorerClient {
        &self.explorer
    }

    pub fn local_store(&self) -> &LocalAppointmentStore {
        &self.store
    }

    pub async fn connect(&self) -> NodeResult<Session> {
        self.session.connect().await
    }

    pub async fn disconnect(&self) {
        self.session.disconnect().await
    }

    pub fn transfer_state(&self) -> WriteState {
        self.transfer_gate.state()
    }

    /// Send native currency from the active account. Recipient and amount
    /// are validated locally before any wallet call; success is reported
    /// only after on-chain confirmation.
    pub async fn transfer(&self, to: &str, amount_eth: &str) -> NodeResult<TxReceipt> {
        let to = Address::parse(to).map_err(|_| NodeError::InvalidAddress)?;
        let amount_wei = parse_eth_amount(amount_eth)?;
        self.session.account().await?;

        self.transfer_gate.begin()?;
        let result = self.transfer_inner(&to, amount_wei).await;
        self.transfer_gate.settle(result.is_ok());
        result
    }

    async fn transfer_inner(&self, to: &Address, amount_wei: u128) -> NodeResult<TxReceipt> {
        let tx_hash = self.provider.transfer(to, amount_wei).await?;
        self.transfer_gate.confirming();
        debug!(%tx_hash, "awaiting transfer confirmation");
        let receipt = self.provider.wait_for_receipt(&tx_hash).await?;
        if !receipt.status {
            return Err(NodeError::Contract(format!(
                "transaction {} reverted",
                receipt.tx_hash
            )));
        }
        info!(tx_hash = %receipt.tx_hash, "transfer confirmed");
        Ok(receipt)
    }
}
