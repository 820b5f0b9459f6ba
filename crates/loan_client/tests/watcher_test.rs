//! Refresh-loop behavior against a scripted snapshot source: publishing on
//! the interval, retaining the last snapshot across read failures, and
//! stopping cleanly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::U256;
use loan_client::{ClientError, LoanSnapshot, LoanSource, Watcher};

/// Succeeds for the first `fail_after` fetches, then fails forever.
/// Each success stamps the fetch index into `fetched_at`.
struct ScriptedSource {
    calls: AtomicUsize,
    fail_after: usize,
}

impl ScriptedSource {
    fn new(fail_after: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_after,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoanSource for ScriptedSource {
    async fn snapshot(&self) -> Result<LoanSnapshot, ClientError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.fail_after {
            return Err(ClientError::Unknown("rpc endpoint down".to_string()));
        }
        Ok(LoanSnapshot {
            loan: None,
            contribution: U256::zero(),
            total_funded: U256::zero(),
            fetched_at: n as u64,
        })
    }
}

#[tokio::test]
async fn watcher_publishes_snapshots_on_the_interval() {
    let source = ScriptedSource::new(usize::MAX);
    let watcher = Watcher::spawn(source.clone(), Duration::from_millis(10));
    let mut rx = watcher.subscribe();

    // First fetch happens immediately
    rx.changed().await.unwrap();
    let first = rx.borrow_and_update().clone().unwrap();
    assert_eq!(first.fetched_at, 0);

    // Subsequent fetches arrive on the interval
    rx.changed().await.unwrap();
    let second = rx.borrow_and_update().clone().unwrap();
    assert!(second.fetched_at > first.fetched_at);
}

// Paused-clock test: sleeps auto-advance, so the elapsed-ticks assertions
// are deterministic rather than wall-clock dependent.
#[tokio::test(start_paused = true)]
async fn watcher_keeps_last_snapshot_when_a_refresh_fails() {
    let source = ScriptedSource::new(1);
    let watcher = Watcher::spawn(source.clone(), Duration::from_millis(5));
    let mut rx = watcher.subscribe();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().clone().unwrap().fetched_at, 0);

    // Let several failing refreshes elapse
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(source.calls() > 2, "poll loop should keep running");

    // The channel still holds the last good snapshot, untouched
    let held = rx.borrow().clone().unwrap();
    assert_eq!(held.fetched_at, 0);
}

#[tokio::test(start_paused = true)]
async fn stopped_watcher_polls_no_further() {
    let source = ScriptedSource::new(usize::MAX);
    let watcher = Watcher::spawn(source.clone(), Duration::from_millis(5));
    let mut rx = watcher.subscribe();

    rx.changed().await.unwrap();
    watcher.stop();

    // An aborted task is never polled again; the fetch count freezes no
    // matter how much clock elapses.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let after_stop = source.calls();
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(source.calls(), after_stop);
}

#[tokio::test]
async fn subscribers_start_empty_until_the_first_fetch() {
    // A source that never answers in time for this test
    let source = ScriptedSource::new(0);
    let watcher = Watcher::spawn(source, Duration::from_secs(3600));
    let rx = watcher.subscribe();
    assert!(rx.borrow().is_none());
}
