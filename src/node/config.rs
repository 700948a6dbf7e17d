//! Node configuration - passed from higher layers

use crate::core::chain;
use std::path::PathBuf;

/// Default deployment addresses for the demo chain (the first two
/// contracts a fresh local deployment produces).
pub const DEFAULT_APPOINTMENTS_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const DEFAULT_STAKING_ADDRESS: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

/// Node configuration. Higher layers construct this.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub app: String,
    /// Default chain for explorer lookups and the demo provider.
    pub chain_id: u64,
    pub appointments_address: String,
    pub staking_address: String,
    pub etherscan_api_key: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl NodeConfig {
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            chain_id: chain::SEPOLIA,
            appointments_address: DEFAULT_APPOINTMENTS_ADDRESS.into(),
            staking_address: DEFAULT_STAKING_ADDRESS.into(),
            etherscan_api_key: None,
            data_dir: None,
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self { self.chain_id = chain_id; self }
    pub fn with_appointments_address(mut self, a: impl Into<String>) -> Self { self.appointments_address = a.into(); self }
    pub fn with_staking_address(mut self, a: impl Into<String>) -> Self { self.staking_address = a.into(); self }
    pub fn with_etherscan_api_key(mut self, key: impl Into<String>) -> Self { self.etherscan_api_key = Some(key.into()); self }
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self { self.data_dir = Some(path.into()); self }

    /// Where this node keeps its files: explicit setting, then the
    /// `CARENODE_ROOT` override, then the platform data directory.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.data_dir {
            return dir.clone();
        }
        let root = std::env::var("CARENODE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."))
            });
        root.join(&self.app)
    }

    /// The local demo appointment file.
    pub fn appointments_file(&self) -> PathBuf {
        self.data_dir().join(format!("{}-appointments.json", self.app))
    }
}
