//! Derived display values. Everything here is a pure computation over an
//! already-fetched snapshot; nothing in this module talks to the chain.

use std::fmt;

use ethers::types::{Address, U256};

use crate::types::LoanRecord;
use crate::units::{wei_to_eth, SECONDS_PER_DAY};

const SECONDS_PER_HOUR: u64 = 3_600;

/// Total repayment owed: principal x (1 + rate / 100).
///
/// The rate is carried in tenths of a percent, so the integer form is
/// target x (1000 + rate_tenths) / 1000, exact in wei.
///
/// Example: 1 ETH at 10% (rate_tenths = 100) -> 1.1 ETH
pub fn repayment_total(target_wei: U256, rate_tenths: u64) -> Option<U256> {
    let multiplier = U256::from(1_000u64) + U256::from(rate_tenths);
    target_wei
        .checked_mul(multiplier)?
        .checked_div(U256::from(1_000u64))
}

/// Funded fraction of the target as a percentage, clamped to [0, 100].
/// Computed in tenths so one decimal survives for display.
pub fn funding_percent(total_funded: U256, target: U256) -> f64 {
    if target.is_zero() {
        return 0.0;
    }
    let tenths = total_funded
        .checked_mul(U256::from(1_000u64))
        .unwrap_or(U256::MAX)
        / target;
    let clamped = tenths.min(U256::from(1_000u64)).as_u64();
    clamped as f64 / 10.0
}

/// Time left on a funded loan's repayment window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimeRemaining {
    NotFunded,
    Expired,
    Left { days: u64, hours: u64 },
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFunded => f.write_str("Not funded yet"),
            Self::Expired => f.write_str("Expired"),
            Self::Left { days, hours } => write!(f, "{days}d {hours}h"),
        }
    }
}

/// Remaining time until `funded_at + duration`, floored at expired.
pub fn time_remaining(loan: &LoanRecord, now: u64) -> TimeRemaining {
    if !loan.is_funded() {
        return TimeRemaining::NotFunded;
    }
    let deadline = loan.funded_at.saturating_add(loan.duration_seconds);
    if now >= deadline {
        return TimeRemaining::Expired;
    }
    let remaining = deadline - now;
    TimeRemaining::Left {
        days: remaining / SECONDS_PER_DAY,
        hours: (remaining % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
    }
}

/// Decimal ETH with a fixed number of fraction digits (truncating).
pub fn format_eth(wei: U256, decimals: usize) -> String {
    let full = wei_to_eth(wei);
    let (whole, frac) = full.split_once('.').unwrap_or((full.as_str(), ""));
    if decimals == 0 {
        return whole.to_string();
    }
    let mut frac: String = frac.chars().take(decimals).collect();
    while frac.len() < decimals {
        frac.push('0');
    }
    format!("{whole}.{frac}")
}

/// `0x1234...abcd` rendering for addresses.
pub fn short_address(address: Address) -> String {
    let hex = format!("{address:?}");
    format!("{}...{}", &hex[..6], &hex[hex.len() - 4..])
}

// ============================================
// ACTION ELIGIBILITY
// ============================================
// Mirrors of the contract's access rules, used to show or hide actions
// before a transaction is ever submitted. The contract remains the
// authority; these only avoid pointless reverts.

/// Only the borrower may cancel, and only while the loan is unresolved.
pub fn can_cancel(loan: &LoanRecord, caller: Address) -> bool {
    loan.borrower == caller && loan.is_open()
}

/// Anyone but the borrower may contribute while the loan is unresolved.
pub fn can_fund(loan: &LoanRecord, caller: Address) -> bool {
    loan.is_open() && loan.borrower != caller
}

/// The borrower repays once the target has been reached.
pub fn can_repay(loan: &LoanRecord, caller: Address) -> bool {
    loan.is_open() && loan.borrower == caller && loan.is_funded()
}

/// Contributors withdraw after the loan resolves (repaid or canceled).
pub fn can_withdraw(loan: &LoanRecord, contribution: U256) -> bool {
    !contribution.is_zero() && !loan.is_open()
}
