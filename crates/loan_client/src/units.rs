//! Human-unit to contract-unit conversion. Forms speak in decimal ETH,
//! whole days, and percent; the contract speaks in wei, seconds, and
//! tenths of a percent. Conversions are exact and reversible for display.

use ethers::types::U256;
use ethers::utils::{format_ether, parse_ether};

use crate::error::ClientError;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Convert a whole-day repayment window to contract seconds.
///
/// Example: 30 days -> 2,592,000 seconds
pub fn days_to_seconds(days: u64) -> Option<u64> {
    days.checked_mul(SECONDS_PER_DAY)
}

/// Inverse of `days_to_seconds` for display. Exact for the whole-day
/// durations this client creates.
pub fn seconds_to_days(seconds: u64) -> u64 {
    seconds / SECONDS_PER_DAY
}

/// Convert a human interest rate in percent to the contract's
/// tenths-of-a-percent representation.
///
/// Example: 7.5% -> 75
///
/// Rejects negative, non-finite, and finer-than-a-tenth inputs rather
/// than rounding silently.
pub fn percent_to_tenths(percent: f64) -> Option<u64> {
    if !percent.is_finite() || percent < 0.0 {
        return None;
    }
    let tenths = percent * 10.0;
    if (tenths - tenths.round()).abs() > 1e-9 {
        return None;
    }
    Some(tenths.round() as u64)
}

/// Inverse of `percent_to_tenths` for display.
pub fn tenths_to_percent(tenths: u64) -> f64 {
    tenths as f64 / 10.0
}

/// Parse a decimal ETH amount (form input) into wei.
pub fn eth_to_wei(amount: &str) -> Result<U256, ClientError> {
    parse_ether(amount)
        .map_err(|e| ClientError::Unknown(format!("invalid amount {amount:?}: {e}")))
}

/// Full-precision decimal ETH rendering of a wei amount.
pub fn wei_to_eth(wei: U256) -> String {
    format_ether(wei)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_conversion_round_trips() {
        let seconds = days_to_seconds(30).unwrap();
        assert_eq!(seconds, 2_592_000);
        assert_eq!(seconds_to_days(seconds), 30);
    }

    #[test]
    fn test_day_conversion_overflow() {
        assert_eq!(days_to_seconds(u64::MAX), None);
    }

    #[test]
    fn test_percent_conversion_round_trips() {
        assert_eq!(percent_to_tenths(10.0), Some(100));
        assert_eq!(percent_to_tenths(7.5), Some(75));
        assert_eq!(percent_to_tenths(0.0), Some(0));
        assert_eq!(tenths_to_percent(75), 7.5);
        assert_eq!(tenths_to_percent(100), 10.0);
    }

    #[test]
    fn test_percent_rejects_bad_inputs() {
        assert_eq!(percent_to_tenths(-1.0), None);
        assert_eq!(percent_to_tenths(f64::NAN), None);
        assert_eq!(percent_to_tenths(f64::INFINITY), None);
        // Finer than a tenth of a percent cannot be represented
        assert_eq!(percent_to_tenths(7.55), None);
    }

    #[test]
    fn test_eth_to_wei() {
        assert_eq!(eth_to_wei("1").unwrap(), U256::exp10(18));
        assert_eq!(
            eth_to_wei("0.5").unwrap(),
            U256::from(500_000_000_000_000_000u64)
        );
        assert!(eth_to_wei("not a number").is_err());
    }

    #[test]
    fn test_wei_to_eth_round_trips() {
        let wei = eth_to_wei("1.5").unwrap();
        let displayed = wei_to_eth(wei);
        assert_eq!(eth_to_wei(&displayed).unwrap(), wei);
    }
}
