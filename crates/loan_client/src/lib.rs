//! Client adapter for a peer-to-peer lending contract.
//!
//! The contract holds all authority: loan accounting, escrow, repayment
//! validation, and access control live on chain. This crate is the thin
//! layer in front of it — it connects a signing session, reads the single
//! loan slot, submits the six operations, and derives the display values a
//! UI needs (repayment total, time remaining, funding percentage).
//!
//! A session is: [`Config`] -> [`connect`] -> ([`LendingClient`],
//! [`ConnectionState`]), with a [`Watcher`] polling snapshots to the UI
//! layer over a watch channel until the session ends.

pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod types;
pub mod units;
pub mod view;
pub mod watcher;

pub use client::{connect, LendingClient, WalletClient};
pub use config::Config;
pub use contract::P2PLending;
pub use error::{ClientError, WALLET_INSTALL_URL};
pub use types::{ConnectionState, LoanRecord, LoanSnapshot, LoanStatus};
pub use view::TimeRemaining;
pub use watcher::{LoanSource, Watcher, DEFAULT_POLL_INTERVAL};
