//! Native-currency units. Wei is the base unit, 10^18 wei per ETH.
//!
//! Amount parsing is exact decimal arithmetic on u128, never float:
//! user-entered fees attach to payable calls and must convert without
//! rounding drift.

use crate::error::NodeError;

pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;
const ETH_DECIMALS: u32 = 18;

/// Parse a user-entered ETH amount into wei.
///
/// Rejects empty, non-numeric, negative, and zero input before any
/// network call is made. More than 18 fractional digits is rejected
/// rather than silently truncated.
pub fn parse_eth_amount(input: &str) -> Result<u128, NodeError> {
    let s = input.trim();
    if s.is_empty() || s.starts_with('-') || s.starts_with('+') {
        return Err(NodeError::InvalidAmount);
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(NodeError::InvalidAmount);
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(NodeError::InvalidAmount);
    }
    if frac_part.len() > ETH_DECIMALS as usize {
        return Err(NodeError::InvalidAmount);
    }

    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| NodeError::InvalidAmount)?
    };
    let frac: u128 = if frac_part.is_empty() {
        0
    } else {
        let padded = format!("{:0<18}", frac_part);
        padded.parse().map_err(|_| NodeError::InvalidAmount)?
    };

    let wei = whole
        .checked_mul(WEI_PER_ETH)
        .and_then(|w| w.checked_add(frac))
        .ok_or(NodeError::InvalidAmount)?;
    if wei == 0 {
        return Err(NodeError::InvalidAmount);
    }
    Ok(wei)
}

/// Exact ETH rendering with trailing zeros trimmed ("1.5", "0.025", "3").
pub fn format_eth(wei: u128) -> String {
    let whole = wei / WEI_PER_ETH;
    let frac = wei % WEI_PER_ETH;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Fixed-decimals display form, rounded half-up (balances show 4 places).
pub fn format_eth_fixed(wei: u128, decimals: u32) -> String {
    let decimals = decimals.min(ETH_DECIMALS);
    if decimals == 0 {
        return ((wei + WEI_PER_ETH / 2) / WEI_PER_ETH).to_string();
    }
    let scale = 10u128.pow(ETH_DECIMALS - decimals);
    let rounded = wei.saturating_add(scale / 2) / scale;
    let unit = 10u128.pow(decimals);
    format!(
        "{}.{:0width$}",
        rounded / unit,
        rounded % unit,
        width = decimals as usize
    )
}

pub fn wei_to_gwei(wei: u128) -> f64 {
    wei as f64 / 1e9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fractional_amounts_exactly() {
        assert_eq!(parse_eth_amount("0.025").unwrap(), 25_000_000_000_000_000);
        assert_eq!(parse_eth_amount("1").unwrap(), WEI_PER_ETH);
        assert_eq!(parse_eth_amount("1.5").unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(parse_eth_amount(".5").unwrap(), 500_000_000_000_000_000);
        assert_eq!(parse_eth_amount(" 0.01 ").unwrap(), 10_000_000_000_000_000);
    }

    #[test]
    fn rejects_bad_amounts() {
        for bad in ["", " ", "-1", "0", "0.0", "abc", "1.2.3", "1e5", "+1", "0.0000000000000000001"] {
            assert!(parse_eth_amount(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn formats_trimmed() {
        assert_eq!(format_eth(25_000_000_000_000_000), "0.025");
        assert_eq!(format_eth(WEI_PER_ETH), "1");
        assert_eq!(format_eth(0), "0");
    }

    #[test]
    fn formats_fixed_four_places() {
        assert_eq!(format_eth_fixed(25_000_000_000_000_000, 4), "0.0250");
        assert_eq!(format_eth_fixed(1_234_567_000_000_000_000, 4), "1.2346");
        assert_eq!(format_eth_fixed(0, 4), "0.0000");
    }

    #[test]
    fn parse_format_round_trip() {
        for s in ["0.025", "1.5", "12.000000000000000001"] {
            let wei = parse_eth_amount(s).unwrap();
            assert_eq!(parse_eth_amount(&format_eth(wei)).unwrap(), wei);
        }
    }
}
