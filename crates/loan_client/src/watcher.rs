use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::Middleware;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, warn};

use crate::client::LendingClient;
use crate::error::ClientError;
use crate::types::LoanSnapshot;

/// Matches the deployment's 10-second refresh cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Anything the watcher can poll a loan snapshot from. The seam exists so
/// the refresh loop can be driven without a live chain.
#[async_trait]
pub trait LoanSource: Send + Sync {
    async fn snapshot(&self) -> Result<LoanSnapshot, ClientError>;
}

#[async_trait]
impl<S: LoanSource> LoanSource for Arc<S> {
    async fn snapshot(&self) -> Result<LoanSnapshot, ClientError> {
        (**self).snapshot().await
    }
}

#[async_trait]
impl<M: Middleware + 'static> LoanSource for LendingClient<M> {
    async fn snapshot(&self) -> Result<LoanSnapshot, ClientError> {
        LendingClient::snapshot(self).await
    }
}

/// The state-refresh loop: fetches a snapshot immediately and then on a
/// fixed interval while the session lives, publishing each result over a
/// watch channel for the UI layer. Read failures are logged and the last
/// good snapshot retained; the poll and any caller-triggered refresh race
/// last-write-wins against the same authoritative source.
pub struct Watcher {
    rx: watch::Receiver<Option<LoanSnapshot>>,
    handle: JoinHandle<()>,
}

impl Watcher {
    pub fn spawn<S: LoanSource + 'static>(source: S, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            loop {
                ticker.tick().await;
                match source.snapshot().await {
                    Ok(snapshot) => {
                        debug!(fetched_at = snapshot.fetched_at, "loan state refreshed");
                        if tx.send(Some(snapshot)).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(%err, "loan refresh failed; keeping last snapshot"),
                }
            }
        });
        Self { rx, handle }
    }

    /// A receiver for the UI layer; `None` until the first successful fetch.
    pub fn subscribe(&self) -> watch::Receiver<Option<LoanSnapshot>> {
        self.rx.clone()
    }

    /// Stop polling. Transactions already submitted are unaffected; only
    /// the refresh loop ends.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
