//! In-process ledger gateway
//!
//! `MemoryGateway` routes transactions to chaincode handlers registered per
//! channel, records every connection and call, and can be told to fail the
//! next connect, network lookup or transaction. It backs the crate's tests and
//! local demos; there is no endorsement or ordering behind it.

use crate::error::GatewayError;
use crate::gateway::{CallContext, ConnectOptions, Connection, Contract, LedgerGateway, Network};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Chaincode stand-in: receives the function name and its arguments.
pub type ChaincodeHandler =
    Arc<dyn Fn(&str, &[&str]) -> Result<Vec<u8>, GatewayError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Submit,
    Evaluate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub channel: String,
    pub chaincode: String,
    pub kind: CallKind,
    pub function: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRecord {
    pub profile: PathBuf,
    pub identity: String,
    pub msp_id: String,
    pub discovery_as_localhost: bool,
}

#[derive(Default)]
struct State {
    handlers: HashMap<(String, String), ChaincodeHandler>,
    channels: HashSet<String>,
    calls: Vec<RecordedCall>,
    connections: Vec<ConnectRecord>,
    open_connections: usize,
    fail_connect: Option<GatewayError>,
    fail_network: Option<GatewayError>,
    fail_calls: VecDeque<GatewayError>,
}

/// Shared handle: clones observe and configure the same gateway.
#[derive(Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<State>>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&self, channel: &str) {
        lock(&self.state).channels.insert(channel.to_string());
    }

    /// Install `handler` as chaincode `chaincode` on `channel`, creating the channel.
    pub fn deploy<F>(&self, channel: &str, chaincode: &str, handler: F)
    where
        F: Fn(&str, &[&str]) -> Result<Vec<u8>, GatewayError> + Send + Sync + 'static,
    {
        let mut state = lock(&self.state);
        state.channels.insert(channel.to_string());
        state.handlers.insert(
            (channel.to_string(), chaincode.to_string()),
            Arc::new(handler),
        );
    }

    /// The next `connect` fails with `err`.
    pub fn fail_connect(&self, err: GatewayError) {
        lock(&self.state).fail_connect = Some(err);
    }

    /// The next network lookup fails with `err`.
    pub fn fail_network(&self, err: GatewayError) {
        lock(&self.state).fail_network = Some(err);
    }

    /// Queue `err` as the outcome of the next transaction.
    pub fn fail_next_call(&self, err: GatewayError) {
        lock(&self.state).fail_calls.push_back(err);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state).calls.clone()
    }

    pub fn connections(&self) -> Vec<ConnectRecord> {
        lock(&self.state).connections.clone()
    }

    pub fn open_connections(&self) -> usize {
        lock(&self.state).open_connections
    }
}

impl LedgerGateway for MemoryGateway {
    fn connect(&self, options: ConnectOptions<'_>) -> Result<Box<dyn Connection>, GatewayError> {
        let mut state = lock(&self.state);
        if let Some(err) = state.fail_connect.take() {
            return Err(err);
        }

        let identity = options
            .wallet
            .get(options.identity)
            .map_err(|e| GatewayError::Connect(e.to_string()))?
            .ok_or_else(|| {
                GatewayError::Connect(format!(
                    "identity {:?} not found in wallet",
                    options.identity
                ))
            })?;

        state.connections.push(ConnectRecord {
            profile: options.profile.to_path_buf(),
            identity: options.identity.to_string(),
            msp_id: identity.msp_id.clone(),
            discovery_as_localhost: options.discovery_as_localhost,
        });
        state.open_connections += 1;

        Ok(Box::new(MemoryConnection {
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }
}

struct MemoryConnection {
    state: Arc<Mutex<State>>,
    closed: bool,
}

impl Connection for MemoryConnection {
    fn network(&self, channel_id: &str) -> Result<Box<dyn Network>, GatewayError> {
        let mut state = lock(&self.state);
        if self.closed {
            return Err(GatewayError::Connect("connection is closed".to_string()));
        }
        if let Some(err) = state.fail_network.take() {
            return Err(err);
        }
        if !state.channels.contains(channel_id) {
            return Err(GatewayError::Network(format!(
                "channel {channel_id} does not exist"
            )));
        }
        Ok(Box::new(MemoryNetwork {
            state: Arc::clone(&self.state),
            channel: channel_id.to_string(),
        }))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let mut state = lock(&self.state);
            state.open_connections = state.open_connections.saturating_sub(1);
        }
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.close();
    }
}

struct MemoryNetwork {
    state: Arc<Mutex<State>>,
    channel: String,
}

impl Network for MemoryNetwork {
    fn name(&self) -> &str {
        &self.channel
    }

    fn contract(&self, chaincode_id: &str) -> Box<dyn Contract> {
        Box::new(MemoryContract {
            state: Arc::clone(&self.state),
            channel: self.channel.clone(),
            chaincode: chaincode_id.to_string(),
        })
    }
}

struct MemoryContract {
    state: Arc<Mutex<State>>,
    channel: String,
    chaincode: String,
}

impl MemoryContract {
    fn call(
        &self,
        kind: CallKind,
        ctx: &CallContext,
        function: &str,
        args: &[&str],
    ) -> Result<Vec<u8>, GatewayError> {
        let handler = {
            let mut state = lock(&self.state);
            state.calls.push(RecordedCall {
                channel: self.channel.clone(),
                chaincode: self.chaincode.clone(),
                kind,
                function: function.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
            });
            if ctx.is_expired() {
                return Err(GatewayError::Timeout);
            }
            if let Some(err) = state.fail_calls.pop_front() {
                return Err(err);
            }
            state
                .handlers
                .get(&(self.channel.clone(), self.chaincode.clone()))
                .cloned()
        };

        // The lock is released so handlers may use the gateway themselves.
        match handler {
            Some(handler) => handler(function, args),
            None => Err(GatewayError::Endorsement(format!(
                "chaincode {} is not deployed on channel {}",
                self.chaincode, self.channel
            ))),
        }
    }
}

impl Contract for MemoryContract {
    fn chaincode_id(&self) -> &str {
        &self.chaincode
    }

    fn submit(
        &self,
        ctx: &CallContext,
        function: &str,
        args: &[&str],
    ) -> Result<Vec<u8>, GatewayError> {
        self.call(CallKind::Submit, ctx, function, args)
    }

    fn evaluate(
        &self,
        ctx: &CallContext,
        function: &str,
        args: &[&str],
    ) -> Result<Vec<u8>, GatewayError> {
        self.call(CallKind::Evaluate, ctx, function, args)
    }
}
