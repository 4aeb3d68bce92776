//! # Fabric Gateway Client
//!
//! A configuration-driven client for a permissioned ledger reached through a
//! gateway SDK. When I come back to this code, here's what I need to remember:
//!
//! ## What It Does
//! - **Layered Configuration**: merges the `[gateway]` and `[sdk]` sections of
//!   `config.toml` with the SDK-level `config.yaml` into one `Configuration`
//! - **Identity Wallet**: file-system store of X.509 identities
//! - **Client Lifecycle**: wallet, gateway connection, network and contract,
//!   then `invoke` (submit) and `query` (evaluate)
//!
//! ## How the Code Is Organized
//! - `config/`: config file parsing and the resolution rules
//! - `client/`: the client state machine and its options
//! - `gateway/`: the traits the gateway SDK is plugged in through, plus an
//!   in-memory gateway
//! - `wallet/`: identities and the file-system wallet
//! - `logging/`: logger bootstrap for the binary
//! - `cli/`: command-line interface
//!
//! ## Things the Client Does Not Do
//! - Consensus, endorsement, discovery and transport stay inside the gateway
//! - Enrolling users with a CA: the wallet must already hold the identity
//! - Retries: a failed transaction is reported to the caller as is

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod wallet;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use client::{Client, ClientOptions, ClientState};
pub use config::{ConfigResolver, Configuration};
pub use error::{ClientError, ConfigError, GatewayError, Result, SetupError, WalletError};
pub use gateway::{
    CallContext, ConnectOptions, Connection, Contract, LedgerGateway, MemoryGateway, Network,
};
pub use logging::{init_logging, LogSettings};
pub use wallet::{FileSystemWallet, IdentityWallet, X509Identity};
