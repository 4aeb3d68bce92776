//! Ledger gateway collaborator
//!
//! This module defines the seam between the client and the SDK that actually
//! talks to the network: peer discovery, endorsement, ordering and the gRPC
//! transport all live behind these traits.
//!
//! - `LedgerGateway`: opens a `Connection` for a connection profile and a
//!   wallet identity
//! - `Connection`: hands out the `Network` of a channel
//! - `Network`: hands out the `Contract` of a chaincode
//! - `Contract`: submits (ordered) or evaluates (local) transactions

pub mod memory;

pub use memory::{CallKind, ConnectRecord, MemoryGateway, RecordedCall};

use crate::error::GatewayError;
use crate::wallet::IdentityWallet;
use std::path::Path;
use std::time::{Duration, Instant};

/// Everything a gateway needs to open one connection.
///
/// Discovery mode travels with the connection instead of a process-wide
/// environment variable, so clients with different settings can coexist.
pub struct ConnectOptions<'a> {
    /// Connection profile (`connection.yaml`)
    pub profile: &'a Path,
    pub wallet: &'a dyn IdentityWallet,
    /// Label of the wallet identity to connect as
    pub identity: &'a str,
    /// Rewrite discovered peer addresses to localhost
    pub discovery_as_localhost: bool,
}

/// Per-call settings handed to the gateway with every transaction.
///
/// The client adds no timeout of its own: without a deadline a call blocks
/// for as long as the gateway does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    pub deadline: Option<Instant>,
}

impl CallContext {
    pub fn with_deadline(deadline: Instant) -> Self {
        CallContext {
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

pub trait LedgerGateway {
    fn connect(&self, options: ConnectOptions<'_>) -> Result<Box<dyn Connection>, GatewayError>;
}

pub trait Connection: Send {
    fn network(&self, channel_id: &str) -> Result<Box<dyn Network>, GatewayError>;

    /// Release the connection. Calling it twice is harmless.
    fn close(&mut self);
}

pub trait Network: Send {
    fn name(&self) -> &str;

    fn contract(&self, chaincode_id: &str) -> Box<dyn Contract>;
}

pub trait Contract: Send + Sync {
    fn chaincode_id(&self) -> &str;

    /// Endorse, order and commit `function(args)`, returning its payload.
    fn submit(
        &self,
        ctx: &CallContext,
        function: &str,
        args: &[&str],
    ) -> Result<Vec<u8>, GatewayError>;

    /// Evaluate `function(args)` on a single peer without ordering.
    fn evaluate(
        &self,
        ctx: &CallContext,
        function: &str,
        args: &[&str],
    ) -> Result<Vec<u8>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_never_expires() {
        assert!(!CallContext::default().is_expired());
    }

    #[test]
    fn test_past_deadline_is_expired() {
        let ctx = CallContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(ctx.is_expired());
        assert!(!CallContext::with_timeout(Duration::from_secs(60)).is_expired());
    }
}
