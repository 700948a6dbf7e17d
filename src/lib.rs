//! Carenode: wallet-session and contract client node for a health dapp.
//!
//! # Architecture
//!
//! ```text
//! Node (entry point)
//!   │
//!   ├── SessionManager (single writer over {account, chain, connected})
//!   │     └── listens: accountsChanged / chainChanged
//!   │
//!   ├── AppointmentsClient ── bounded ID probing (doctors 1..=10,
//!   │     appointments 1..=100), payable booking, cancellation
//!   ├── StakingClient ────── stake / withdraw / position lookup
//!   │     └── both gated by a per-client write state machine
//!   │
//!   ├── ExplorerClient ───── REST lookups (balance, tx, ABI, gas)
//!   └── LocalAppointmentStore ── JSON demo records, never chain data
//! ```
//!
//! The injected wallet is reached through the `WalletProvider` trait;
//! `MemoryProvider` implements it in-process for the CLI demo mode and
//! the test suite.
//!
//! # Usage
//!
//! ```ignore
//! use carenode::{MemoryProvider, Node, NodeConfig};
//! use std::sync::Arc;
//!
//! let config = NodeConfig::new("careapp").with_etherscan_api_key("KEY");
//! let provider = Arc::new(MemoryProvider::demo(/* addresses, chain */).await);
//! let node = Node::from_config(config, provider)?;
//!
//! node.connect().await?;
//! let doctors = node.appointments().list_doctors().await?;
//! let receipt = node.appointments().book_appointment(2, 1_700_000_000, "0.025").await?;
//! ```

pub mod contracts;
pub mod core;
pub mod error;
pub mod explorer;
pub mod logging;
pub mod node;
pub mod provider;
pub mod session;
pub mod store;

pub use contracts::{
    Appointment, AppointmentView, AppointmentsClient, Doctor, StakeInfo, StakingClient,
    WriteGate, WriteState, APPOINTMENT_PROBE_RANGE, DOCTOR_PROBE_RANGE,
};
pub use core::{format_eth, format_eth_fixed, is_address, parse_eth_amount, Address};
pub use error::{NodeError, NodeResult};
pub use explorer::ExplorerClient;
pub use node::{Node, NodeConfig};
pub use provider::{
    MemoryProvider, ProviderError, ProviderEvent, TxReceipt, WalletProvider,
};
pub use session::{Session, SessionEvent, SessionManager};
pub use store::{LocalAppointmentStore, StoredAppointment};
