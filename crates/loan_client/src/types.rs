use chrono::Utc;
use ethers::types::{Address, U256};
use serde::Serialize;

use crate::error::ClientError;

/// Snapshot of the contract's single loan slot, as returned by the
/// `currentLoan()` view. Read-only projection of remote state; replaced
/// wholesale on every refresh, never mutated locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoanRecord {
    /// Address that opened the loan request
    pub borrower: Address,
    /// Requested principal, in wei
    pub target_amount: U256,
    /// Repayment window, in seconds
    pub duration_seconds: u64,
    /// Interest rate in tenths of a percent (75 = 7.5%)
    pub interest_rate_tenths: u64,
    /// Unix timestamp the target was reached; 0 = not yet funded
    pub funded_at: u64,
    /// Borrower canceled before repayment
    pub canceled: bool,
    /// Borrower repaid in full
    pub repaid: bool,
}

impl LoanRecord {
    /// Neither repaid nor canceled.
    pub fn is_open(&self) -> bool {
        !self.repaid && !self.canceled
    }

    /// Contributions have reached the target.
    pub fn is_funded(&self) -> bool {
        self.funded_at > 0
    }
}

impl From<(Address, U256, U256, U256, U256, bool, bool)> for LoanRecord {
    fn from(raw: (Address, U256, U256, U256, U256, bool, bool)) -> Self {
        Self {
            borrower: raw.0,
            target_amount: raw.1,
            duration_seconds: u256_to_u64(raw.2),
            interest_rate_tenths: u256_to_u64(raw.3),
            funded_at: u256_to_u64(raw.4),
            canceled: raw.5,
            repaid: raw.6,
        }
    }
}

/// Display status of the loan slot, derived in precedence order:
/// repaid wins over canceled, which wins over the funding states.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum LoanStatus {
    NoActiveLoan,
    Repaid,
    Canceled,
    AwaitingFunding,
    Active,
}

impl LoanStatus {
    pub fn of(loan: Option<&LoanRecord>) -> Self {
        match loan {
            None => Self::NoActiveLoan,
            Some(l) if l.repaid => Self::Repaid,
            Some(l) if l.canceled => Self::Canceled,
            Some(l) if !l.is_funded() => Self::AwaitingFunding,
            Some(_) => Self::Active,
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NoActiveLoan => "No active loan",
            Self::Repaid => "Repaid",
            Self::Canceled => "Canceled",
            Self::AwaitingFunding => "Waiting for funding",
            Self::Active => "Active",
        };
        f.write_str(text)
    }
}

/// One refresh cycle's view of the contract: the loan slot, the connected
/// account's contribution, and the contract balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoanSnapshot {
    pub loan: Option<LoanRecord>,
    /// The connected account's contribution to the current loan, in wei
    pub contribution: U256,
    /// Contract balance, in wei
    pub total_funded: U256,
    /// Unix timestamp of the fetch
    pub fetched_at: u64,
}

/// The local session: connected account, observed chain, target contract.
/// Created by `connect()`, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub address: Address,
    pub chain_id: u64,
    pub expected_chain_id: u64,
    pub contract_address: Address,
}

impl ConnectionState {
    pub fn network_ok(&self) -> bool {
        self.chain_id == self.expected_chain_id
    }

    /// Hard form of the connect-time network warning, for callers that
    /// refuse to act across a chain mismatch.
    pub fn ensure_network(&self) -> Result<(), ClientError> {
        if self.network_ok() {
            Ok(())
        } else {
            Err(ClientError::NetworkMismatch {
                expected: self.expected_chain_id,
                actual: self.chain_id,
            })
        }
    }
}

/// Current unix time, for snapshot stamps and deadline math.
pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Durations, timestamps, and rates all fit comfortably in u64; saturate
/// rather than panic if the contract ever reports garbage.
pub(crate) fn u256_to_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(funded_at: u64, canceled: bool, repaid: bool) -> LoanRecord {
        LoanRecord {
            borrower: Address::repeat_byte(0xab),
            target_amount: U256::exp10(18),
            duration_seconds: 30 * 86_400,
            interest_rate_tenths: 100,
            funded_at,
            canceled,
            repaid,
        }
    }

    #[test]
    fn test_record_from_contract_tuple() {
        let borrower = Address::repeat_byte(0x11);
        let raw = (
            borrower,
            U256::exp10(18),
            U256::from(2_592_000u64),
            U256::from(100u64),
            U256::zero(),
            false,
            false,
        );

        let record = LoanRecord::from(raw);
        assert_eq!(record.borrower, borrower);
        assert_eq!(record.target_amount, U256::exp10(18));
        assert_eq!(record.duration_seconds, 2_592_000);
        assert_eq!(record.interest_rate_tenths, 100);
        assert!(!record.is_funded());
        assert!(record.is_open());
    }

    #[test]
    fn test_status_precedence() {
        assert_eq!(LoanStatus::of(None), LoanStatus::NoActiveLoan);
        assert_eq!(
            LoanStatus::of(Some(&record(100, false, true))),
            LoanStatus::Repaid
        );
        // Repaid wins even against a malformed repaid+canceled record
        assert_eq!(
            LoanStatus::of(Some(&record(100, true, true))),
            LoanStatus::Repaid
        );
        assert_eq!(
            LoanStatus::of(Some(&record(100, true, false))),
            LoanStatus::Canceled
        );
        assert_eq!(
            LoanStatus::of(Some(&record(0, false, false))),
            LoanStatus::AwaitingFunding
        );
        assert_eq!(
            LoanStatus::of(Some(&record(100, false, false))),
            LoanStatus::Active
        );
    }

    #[test]
    fn test_status_display_strings() {
        assert_eq!(LoanStatus::NoActiveLoan.to_string(), "No active loan");
        assert_eq!(LoanStatus::AwaitingFunding.to_string(), "Waiting for funding");
    }

    #[test]
    fn test_u256_to_u64_saturates() {
        assert_eq!(u256_to_u64(U256::from(42u64)), 42);
        assert_eq!(u256_to_u64(U256::from(u64::MAX)), u64::MAX);
        assert_eq!(u256_to_u64(U256::from(u64::MAX) + 1), u64::MAX);
    }

    #[test]
    fn test_ensure_network() {
        let state = ConnectionState {
            address: Address::zero(),
            chain_id: 80_001,
            expected_chain_id: 11_155_111,
            contract_address: Address::zero(),
        };
        assert!(!state.network_ok());
        match state.ensure_network() {
            Err(ClientError::NetworkMismatch { expected, actual }) => {
                assert_eq!(expected, 11_155_111);
                assert_eq!(actual, 80_001);
            }
            other => panic!("expected NetworkMismatch, got {other:?}"),
        }
    }
}
