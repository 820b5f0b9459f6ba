use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ethers::contract::ContractCall;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionReceipt, U256, U64};
use tracing::{debug, info, warn};

use crate::config::{chain_name, Config};
use crate::contract::P2PLending;
use crate::error::ClientError;
use crate::types::{unix_now, u256_to_u64, ConnectionState, LoanRecord, LoanSnapshot};
use crate::units;

/// The adapter a `connect()`ed session uses: a signing middleware over the
/// configured endpoint, wrapped by the generated contract binding.
pub type WalletClient = LendingClient<SignerMiddleware<Provider<Http>, LocalWallet>>;

/// Contract client adapter. Translates UI intents into contract calls and
/// contract state into display-ready records. Holds no authority over loan
/// state; it requests transitions and reflects the confirmed outcome.
#[derive(Debug)]
pub struct LendingClient<M: Middleware> {
    contract: P2PLending<M>,
    middleware: Arc<M>,
    account: Address,
    in_flight: AtomicBool,
}

/// Request wallet authorization for a session.
///
/// Failure classes mirror the wallet boundary: `ProviderAbsent` when no
/// endpoint is configured or nothing answers there, `UserRejected` /
/// `RequestPending` when a wallet-backed endpoint refuses or stalls the
/// request. A chain mismatch is warned about and recorded, never fatal.
pub async fn connect(config: &Config) -> Result<(WalletClient, ConnectionState), ClientError> {
    if config.rpc_url.trim().is_empty() {
        return Err(ClientError::ProviderAbsent);
    }
    let provider =
        Provider::<Http>::try_from(config.rpc_url.as_str()).map_err(|_| ClientError::ProviderAbsent)?;

    let chain_id = u256_to_u64(provider.get_chainid().await.map_err(ClientError::from)?);

    let wallet: LocalWallet = config
        .private_key
        .parse()
        .map_err(|e| ClientError::Unknown(format!("invalid signing key: {e}")))?;
    let wallet = wallet.with_chain_id(chain_id);
    let account = wallet.address();

    if chain_id != config.chain_id {
        warn!(
            expected = config.chain_id,
            actual = chain_id,
            "connected to {}, expected {}",
            chain_name(chain_id),
            chain_name(config.chain_id)
        );
    }

    let middleware = Arc::new(SignerMiddleware::new(provider, wallet));
    let client = LendingClient::new(middleware, config.contract_address, account);
    let state = ConnectionState {
        address: account,
        chain_id,
        expected_chain_id: config.chain_id,
        contract_address: config.contract_address,
    };

    info!(account = %account, chain_id, "wallet connected");
    Ok((client, state))
}

impl<M: Middleware + 'static> LendingClient<M> {
    pub fn new(middleware: Arc<M>, contract_address: Address, account: Address) -> Self {
        Self {
            contract: P2PLending::new(contract_address, middleware.clone()),
            middleware,
            account,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    // ============================================
    // READS
    // ============================================

    /// The current loan, or `None` when the contract reports a zero target
    /// (the slot is empty or was never used).
    pub async fn fetch_loan(&self) -> Result<Option<LoanRecord>, ClientError> {
        let raw = self
            .contract
            .current_loan()
            .call()
            .await
            .map_err(ClientError::from)?;
        let record = LoanRecord::from(raw);
        Ok((!record.target_amount.is_zero()).then_some(record))
    }

    /// The given address's contribution to the current loan.
    pub async fn fetch_contribution(&self, address: Address) -> Result<U256, ClientError> {
        self.contract
            .contribution(address)
            .call()
            .await
            .map_err(ClientError::from)
    }

    /// Contract balance, i.e. how much has been funded so far.
    pub async fn fetch_total_funded(&self) -> Result<U256, ClientError> {
        self.middleware
            .get_balance(self.contract.address(), None)
            .await
            .map_err(ClientError::from_middleware)
    }

    /// One refresh cycle: loan slot, the session account's contribution,
    /// and the funded balance.
    pub async fn snapshot(&self) -> Result<LoanSnapshot, ClientError> {
        let loan = self.fetch_loan().await?;
        let (contribution, total_funded) = match loan {
            Some(_) => (
                self.fetch_contribution(self.account).await?,
                self.fetch_total_funded().await?,
            ),
            None => (U256::zero(), U256::zero()),
        };
        Ok(LoanSnapshot {
            loan,
            contribution,
            total_funded,
            fetched_at: unix_now(),
        })
    }

    // ============================================
    // WRITES
    // ============================================
    // Each write converts human units, submits, awaits confirmation, then
    // attempts a refresh so the caller sees the post-transaction state
    // without a second round trip of its own. An `Err` from these methods
    // always means the transaction itself did not confirm; once the
    // receipt lands, a failing refresh downgrades to `Ok(None)`.

    /// Open a loan request. The contract rejects this while an unresolved
    /// loan exists; the client does not pre-check.
    pub async fn create_loan(
        &self,
        amount_eth: &str,
        duration_days: u64,
        rate_percent: f64,
    ) -> Result<Option<LoanSnapshot>, ClientError> {
        let target = units::eth_to_wei(amount_eth)?;
        let seconds = units::days_to_seconds(duration_days)
            .ok_or_else(|| ClientError::Unknown(format!("duration {duration_days}d overflows")))?;
        let tenths = units::percent_to_tenths(rate_percent).ok_or_else(|| {
            ClientError::Unknown(format!("invalid interest rate {rate_percent}%"))
        })?;

        let call = self
            .contract
            .create_loan(target, U256::from(seconds), U256::from(tenths));
        self.submit("createLoan", call).await?;
        Ok(self.refresh_after("createLoan").await)
    }

    /// Contribute the given amount toward the current loan's target.
    pub async fn fund_loan(&self, amount_eth: &str) -> Result<Option<LoanSnapshot>, ClientError> {
        let value = units::eth_to_wei(amount_eth)?;
        let call = self.contract.fund_loan().value(value);
        self.submit("fundLoan", call).await?;
        Ok(self.refresh_after("fundLoan").await)
    }

    /// Repay the given amount; the contract enforces the required total.
    pub async fn repay_loan(&self, amount_eth: &str) -> Result<Option<LoanSnapshot>, ClientError> {
        let value = units::eth_to_wei(amount_eth)?;
        let call = self.contract.repay_loan().value(value);
        self.submit("repayLoan", call).await?;
        Ok(self.refresh_after("repayLoan").await)
    }

    /// Withdraw this account's contribution after the loan resolves.
    pub async fn withdraw_as_lender(&self) -> Result<Option<LoanSnapshot>, ClientError> {
        let call = self.contract.withdraw_as_lender();
        self.submit("withdrawAsLender", call).await?;
        Ok(self.refresh_after("withdrawAsLender").await)
    }

    /// Cancel the current loan (borrower only, contract-enforced).
    pub async fn cancel_loan(&self) -> Result<Option<LoanSnapshot>, ClientError> {
        let call = self.contract.cancel_loan();
        self.submit("cancelLoan", call).await?;
        Ok(self.refresh_after("cancelLoan").await)
    }

    /// Refresh after a confirmed transaction. A read failure here must not
    /// turn a transaction that is already on chain into an error the
    /// caller might answer by resubmitting; log it and let the watcher
    /// deliver the next snapshot instead.
    async fn refresh_after(&self, action: &str) -> Option<LoanSnapshot> {
        match self.snapshot().await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(action, %err, "refresh after confirmed transaction failed");
                None
            }
        }
    }

    /// Submit one state-changing call and wait for its confirmation.
    /// Guarded by the session's in-flight flag: a second submission while
    /// one is pending fails with `RequestPending` instead of queueing.
    async fn submit(
        &self,
        action: &str,
        call: ContractCall<M, ()>,
    ) -> Result<TransactionReceipt, ClientError> {
        let _guard = InFlight::acquire(&self.in_flight)?;

        debug!(action, "submitting transaction");
        let pending = call.send().await.map_err(ClientError::from)?;
        let receipt = pending
            .await
            .map_err(ClientError::from)?
            .ok_or_else(|| ClientError::Unknown("transaction dropped from the mempool".into()))?;

        if receipt.status != Some(U64::from(1)) {
            // Mined but reverted; no reason string survives the receipt.
            return Err(ClientError::ContractRevert(format!(
                "{action} reverted on chain"
            )));
        }

        info!(action, tx = ?receipt.transaction_hash, "transaction confirmed");
        Ok(receipt)
    }
}

/// RAII busy flag. Held for the lifetime of one submitted transaction;
/// released on drop whether the transaction confirmed or failed.
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ClientError> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClientError::RequestPending);
        }
        Ok(Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
