use std::env;
use std::time::Duration;

use ethers::types::Address;
use serde::Deserialize;

use crate::error::ClientError;
use crate::watcher::DEFAULT_POLL_INTERVAL;

/// Chain ids the deployment targets. Sepolia is the default.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const MUMBAI_CHAIN_ID: u64 = 80_001;

/// Human name for a chain id, for the network-mismatch warning.
pub fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        SEPOLIA_CHAIN_ID => "Sepolia Test Network",
        MUMBAI_CHAIN_ID => "Mumbai Testnet",
        _ => "unknown network",
    }
}

/// Session settings: where the wallet provider listens, which key signs,
/// which contract to talk to, and which chain is expected.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Wallet provider / node endpoint URL
    pub rpc_url: String,
    /// Hex-encoded signing key for the session account
    pub private_key: String,
    /// Deployed lending contract
    pub contract_address: Address,
    /// Expected chain; a mismatch warns but does not block
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Loan-state refresh interval
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_chain_id() -> u64 {
    SEPOLIA_CHAIN_ID
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

impl Config {
    /// Refresh cadence for [`crate::watcher::Watcher::spawn`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Read settings from `LOAN_*` environment variables. A missing RPC
    /// endpoint is the provider-absent failure, the library-level analog
    /// of the wallet extension not being installed.
    pub fn from_env() -> Result<Self, ClientError> {
        let rpc_url = env::var("LOAN_RPC_URL").map_err(|_| ClientError::ProviderAbsent)?;
        let private_key = env::var("LOAN_PRIVATE_KEY")
            .map_err(|_| ClientError::Unknown("LOAN_PRIVATE_KEY is not set".to_string()))?;
        let contract_address = env::var("LOAN_CONTRACT_ADDRESS")
            .map_err(|_| ClientError::Unknown("LOAN_CONTRACT_ADDRESS is not set".to_string()))?
            .parse()
            .map_err(|e| ClientError::Unknown(format!("invalid contract address: {e}")))?;
        let chain_id = match env::var("LOAN_CHAIN_ID") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| ClientError::Unknown(format!("invalid LOAN_CHAIN_ID: {e}")))?,
            Err(_) => default_chain_id(),
        };
        let poll_interval_secs = match env::var("LOAN_POLL_INTERVAL_SECS") {
            Ok(raw) => raw.parse().map_err(|e| {
                ClientError::Unknown(format!("invalid LOAN_POLL_INTERVAL_SECS: {e}"))
            })?,
            Err(_) => default_poll_interval(),
        };

        Ok(Self {
            rpc_url,
            private_key,
            contract_address,
            chain_id,
            poll_interval_secs,
        })
    }
}
