//! Shared primitives: addresses, currency units, chain registry.

pub mod address;
pub mod chain;
pub mod units;

pub use address::{is_address, Address};
pub use units::{format_eth, format_eth_fixed, parse_eth_amount, wei_to_gwei, WEI_PER_ETH};
