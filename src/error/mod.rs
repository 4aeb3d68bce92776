//! Error handling for the gateway client
//!
//! This module provides the error types for every layer of the client:
//! configuration resolution, the identity wallet, the ledger gateway
//! collaborator and the client lifecycle itself.

use std::path::PathBuf;

use thiserror::Error;

use crate::client::ClientState;
use crate::config::Configuration;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Boxed parser error kept as the source of a configuration failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error returned by the client API
#[derive(Debug, Error)]
pub enum ClientError {
    /// The layered configuration could not be resolved
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Setup failed while the client was initializing
    #[error("Client setup failed: {0}")]
    Setup(#[from] SetupError),
    /// An operation was attempted outside the `Ready` state
    #[error("Client is not initialized (state: {state})")]
    NotInitialized { state: ClientState },
    /// `initialize` was called on a client that already left `Uninitialized`
    #[error("Client was already initialized (state: {state})")]
    AlreadyInitialized { state: ClientState },
    /// A submitted or evaluated transaction was rejected by the gateway
    #[error("Transaction {function} failed: {source}")]
    Transaction {
        function: String,
        #[source]
        source: GatewayError,
    },
    /// Wallet operation errors outside of client setup
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The process logger could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Failures of the layered configuration resolution
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No primary config file with a supported extension exists
    #[error("config file {base} not found in {}", dir.display())]
    NotFound { base: String, dir: PathBuf },
    /// The primary config file exists but could not be read
    #[error("could not read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The primary config file is not a valid document
    #[error("could not parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    /// Neither the [sdk] nor the [gateway] section carries the required data
    #[error(
        "configuration file {} misses important data in [sdk] and/or [gateway] sections",
        path.display()
    )]
    MissingSections { path: PathBuf },
    /// No `dir` field in either section and no explicit override
    #[error("configuration file {} misses the field dir", path.display())]
    MissingDir { path: PathBuf },
    /// Channel or chaincode identifier is still empty after resolution
    #[error("configuration file {} does not define {field}", path.display())]
    MissingIdentifier { path: PathBuf, field: &'static str },
    /// The SDK-level config file is unreadable or malformed
    #[error("could not read SDK configuration file {}: {source}", path.display())]
    SecondaryLoad {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    /// The SDK-level config file is absent but the gateway section sufficed.
    ///
    /// The otherwise complete configuration travels with the error so the
    /// caller can decide to go on with it.
    #[error("no SDK configuration file at {}", path.display())]
    NoSecondarySource {
        path: PathBuf,
        config: Box<Configuration>,
    },
    /// The executable directory needed to anchor a relative dir is unknown
    #[error("could not locate the running executable: {source}")]
    Executable {
        #[source]
        source: std::io::Error,
    },
    /// ChaincodePath and ChaincodePackage are both set or both empty
    #[error("could not decide between ChaincodePath and ChaincodePackage")]
    ChaincodeSource,
}

/// Failures while bringing a client to the `Ready` state
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("could not open wallet at {}: {source}", path.display())]
    WalletInit {
        path: PathBuf,
        #[source]
        source: WalletError,
    },
    #[error("no connection profile configured; the [gateway] section needs a Connection field")]
    NoConnectionProfile,
    #[error("could not connect to gateway with profile {}: {source}", profile.display())]
    GatewayConnect {
        profile: PathBuf,
        #[source]
        source: GatewayError,
    },
    #[error("could not acquire network for channel {channel}: {source}")]
    NetworkAcquire {
        channel: String,
        #[source]
        source: GatewayError,
    },
}

/// Identity wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    /// Labels become file names and may not escape the wallet directory
    #[error("invalid identity label {0:?}")]
    InvalidLabel(String),
    #[error("wallet I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed identity file {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors reported by the ledger gateway collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("network unavailable: {0}")]
    Network(String),
    #[error("endorsement failed: {0}")]
    Endorsement(String),
    #[error("deadline exceeded")]
    Timeout,
    #[error("{0}")]
    Other(String),
}
