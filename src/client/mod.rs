//! Gateway client
//!
//! This module holds the client lifecycle: it resolves the configuration,
//! opens the wallet, connects through a `LedgerGateway` and exposes
//! `invoke` (submit) and `query` (evaluate) on the configured chaincode.

#[allow(clippy::module_inception)]
pub mod client;
pub mod options;

pub use client::{Client, ClientState};
pub use options::{ClientOptions, DEFAULT_WALLET_DIR};
