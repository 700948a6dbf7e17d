//! Chain-id to block-explorer URL mapping.

pub const MAINNET: u64 = 1;
pub const SEPOLIA: u64 = 11_155_111;
pub const GOERLI: u64 = 5;
pub const POLYGON: u64 = 137;
pub const MUMBAI: u64 = 80_001;
pub const BSC: u64 = 56;
pub const BSC_TESTNET: u64 = 97;

/// Explorer website for a chain. Unknown chains fall back to Sepolia,
/// the network the contracts are deployed on.
pub fn explorer_base_url(chain_id: u64) -> &'static str {
    match chain_id {
        MAINNET => "https://etherscan.io",
        SEPOLIA => "https://sepolia.etherscan.io",
        GOERLI => "https://goerli.etherscan.io",
        POLYGON => "https://polygonscan.com",
        MUMBAI => "https://mumbai.polygonscan.com",
        BSC => "https://bscscan.com",
        BSC_TESTNET => "https://testnet.bscscan.com",
        _ => "https://sepolia.etherscan.io",
    }
}

/// REST endpoint for the same explorer (`api.` subdomain).
pub fn explorer_api_url(chain_id: u64) -> String {
    explorer_base_url(chain_id).replace("https://", "https://api.")
}

pub fn transaction_url(tx_hash: &str, chain_id: u64) -> String {
    format!("{}/tx/{}", explorer_base_url(chain_id), tx_hash)
}

pub fn address_url(address: &str, chain_id: u64) -> String {
    format!("{}/address/{}", explorer_base_url(chain_id), address)
}

pub fn contract_url(address: &str, chain_id: u64) -> String {
    format!("{}/address/{}#code", explorer_base_url(chain_id), address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_chains_map() {
        assert_eq!(explorer_base_url(1), "https://etherscan.io");
        assert_eq!(explorer_base_url(137), "https://polygonscan.com");
        assert_eq!(explorer_api_url(SEPOLIA), "https://api.sepolia.etherscan.io");
    }

    #[test]
    fn unknown_chain_defaults_to_sepolia() {
        assert_eq!(explorer_base_url(424242), "https://sepolia.etherscan.io");
    }

    #[test]
    fn url_builders() {
        assert_eq!(
            transaction_url("0xdead", MAINNET),
            "https://etherscan.io/tx/0xdead"
        );
        assert_eq!(
            contract_url("0xbeef", MAINNET),
            "https://etherscan.io/address/0xbeef#code"
        );
    }
}
