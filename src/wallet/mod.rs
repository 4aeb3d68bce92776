//! Identity wallet
//!
//! This module stores the named X.509 identities the client signs
//! transactions with. Populating the wallet from a CA enrollment is not
//! handled here: identities are imported as existing certificate/key pairs.

pub mod filesystem;
pub mod identity;

pub use filesystem::{FileSystemWallet, IDENTITY_FILE_EXTENSION};
pub use identity::{Credentials, IdentityType, PrivateKeyPem, X509Identity, IDENTITY_VERSION};

use crate::error::WalletError;

/// Store of named identities consulted by the gateway on connect
pub trait IdentityWallet {
    /// False for unknown and for invalid labels.
    fn exists(&self, label: &str) -> bool;

    fn get(&self, label: &str) -> Result<Option<X509Identity>, WalletError>;

    /// Store `identity` under `label`, replacing any previous one.
    fn put(&self, label: &str, identity: &X509Identity) -> Result<(), WalletError>;

    /// Sorted labels of every stored identity.
    fn list(&self) -> Result<Vec<String>, WalletError>;

    /// Removing an unknown label is not an error.
    fn remove(&self, label: &str) -> Result<(), WalletError>;
}
