use crate::client::ClientOptions;
use crate::config::Configuration;
use crate::error::{ClientError, ConfigError, Result, SetupError};
use crate::gateway::{CallContext, ConnectOptions, Connection, Contract, LedgerGateway, Network};
use crate::wallet::{FileSystemWallet, IdentityWallet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Lifecycle of a [`Client`].
///
/// `Uninitialized -> Initializing -> Ready -> Closed`, or
/// `Uninitialized -> Initializing -> Failed`. `Failed` and `Closed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
    Closed,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Uninitialized => "uninitialized",
            ClientState::Initializing => "initializing",
            ClientState::Ready => "ready",
            ClientState::Failed => "failed",
            ClientState::Closed => "closed",
        };
        f.write_str(name)
    }
}

struct Session {
    connection: Box<dyn Connection>,
    network: Box<dyn Network>,
    contract: Box<dyn Contract>,
}

/// Connection to one chaincode of one channel, as one wallet identity.
pub struct Client {
    config: Configuration,
    wallet_dir: PathBuf,
    state: ClientState,
    wallet: Option<FileSystemWallet>,
    session: Option<Session>,
}

impl Client {
    /// Create a client for the config file `<search_dir>/<base_name>.toml` and
    /// bring it to `Ready` through `gateway`.
    ///
    /// A missing SDK-level config file is tolerated when the `[gateway]`
    /// section is complete on its own.
    pub fn create(
        base_name: &str,
        search_dir: impl AsRef<Path>,
        options: &ClientOptions,
        gateway: &dyn LedgerGateway,
    ) -> Result<Client> {
        let config = options
            .resolver()
            .resolve(base_name, search_dir.as_ref())
            .or_else(ConfigError::into_tolerated)?;
        let wallet_dir = options.wallet_dir_for(&config);

        let mut client = Client::new_uninitialized(config, wallet_dir);
        client.initialize(gateway)?;
        Ok(client)
    }

    /// A client that has not connected yet. Call [`Client::initialize`] next.
    pub fn new_uninitialized(config: Configuration, wallet_dir: impl Into<PathBuf>) -> Client {
        Client {
            config,
            wallet_dir: wallet_dir.into(),
            state: ClientState::Uninitialized,
            wallet: None,
            session: None,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn wallet_dir(&self) -> &Path {
        &self.wallet_dir
    }

    /// The wallet opened during setup, if setup got that far.
    pub fn wallet(&self) -> Option<&FileSystemWallet> {
        self.wallet.as_ref()
    }

    /// Open the wallet, connect to the gateway and acquire the contract.
    ///
    /// Any failure leaves the client in the terminal `Failed` state.
    pub fn initialize(&mut self, gateway: &dyn LedgerGateway) -> Result<()> {
        if self.state != ClientState::Uninitialized {
            return Err(ClientError::AlreadyInitialized { state: self.state });
        }
        self.state = ClientState::Initializing;

        match self.setup(gateway) {
            Ok((wallet, session)) => {
                self.wallet = Some(wallet);
                self.session = Some(session);
                self.state = ClientState::Ready;
                log::info!(
                    "client ready on channel {} chaincode {}",
                    self.config.channel_id,
                    self.config.chaincode_id
                );
                Ok(())
            }
            Err(e) => {
                log::error!("client setup failed: {e}");
                self.state = ClientState::Failed;
                Err(e.into())
            }
        }
    }

    fn setup(
        &self,
        gateway: &dyn LedgerGateway,
    ) -> std::result::Result<(FileSystemWallet, Session), SetupError> {
        let config = &self.config;
        let discovery_as_localhost = config.discovery_as_localhost();
        log::debug!("discovery as localhost = {discovery_as_localhost}");

        let wallet =
            FileSystemWallet::open(&self.wallet_dir).map_err(|source| SetupError::WalletInit {
                path: self.wallet_dir.clone(),
                source,
            })?;
        if !wallet.exists(&config.user) {
            // Enrolling the user is out of reach of this client; the gateway
            // rejects the connection if the identity is really needed.
            log::warn!(
                "identity {:?} is not in wallet {}",
                config.user,
                self.wallet_dir.display()
            );
        }
        log::debug!("wallet operational");

        let profile = config
            .connection_file
            .as_deref()
            .ok_or(SetupError::NoConnectionProfile)?;
        log::debug!("connection file {}", profile.display());
        let mut connection = gateway
            .connect(ConnectOptions {
                profile,
                wallet: &wallet,
                identity: &config.user,
                discovery_as_localhost,
            })
            .map_err(|source| SetupError::GatewayConnect {
                profile: profile.to_path_buf(),
                source,
            })?;
        log::debug!("gateway connected");

        let network = match connection.network(&config.channel_id) {
            Ok(network) => network,
            Err(source) => {
                connection.close();
                return Err(SetupError::NetworkAcquire {
                    channel: config.channel_id.clone(),
                    source,
                });
            }
        };
        log::debug!("network acquired");

        let contract = network.contract(&config.chaincode_id);
        Ok((
            wallet,
            Session {
                connection,
                network,
                contract,
            },
        ))
    }

    fn contract(&self) -> Result<&dyn Contract> {
        match (&self.session, self.state) {
            (Some(session), ClientState::Ready) => Ok(session.contract.as_ref()),
            _ => Err(ClientError::NotInitialized { state: self.state }),
        }
    }

    /// Submit the transaction `function(args)` for endorsement and ordering.
    ///
    /// Blocks until the gateway answers. Failures are returned as is, with no retry.
    pub fn invoke(&self, function: &str, args: &[&str]) -> Result<Vec<u8>> {
        self.invoke_with(&CallContext::default(), function, args)
    }

    pub fn invoke_with(&self, ctx: &CallContext, function: &str, args: &[&str]) -> Result<Vec<u8>> {
        let contract = self.contract()?;
        log::debug!("invoke {function} with {} args", args.len());
        contract
            .submit(ctx, function, args)
            .map_err(|source| ClientError::Transaction {
                function: function.to_string(),
                source,
            })
    }

    /// Evaluate the transaction `function(args)` against the current state.
    pub fn query(&self, function: &str, args: &[&str]) -> Result<Vec<u8>> {
        self.query_with(&CallContext::default(), function, args)
    }

    pub fn query_with(&self, ctx: &CallContext, function: &str, args: &[&str]) -> Result<Vec<u8>> {
        let contract = self.contract()?;
        log::debug!("query {function} with {} args", args.len());
        contract
            .evaluate(ctx, function, args)
            .map_err(|source| ClientError::Transaction {
                function: function.to_string(),
                source,
            })
    }

    /// Release the gateway connection. Only a `Ready` client changes state.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            log::debug!("closing connection to channel {}", session.network.name());
            session.connection.close();
        }
        if self.state == ClientState::Ready {
            self.state = ClientState::Closed;
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("channel_id", &self.config.channel_id)
            .field("chaincode_id", &self.config.chaincode_id)
            .field("user", &self.config.user)
            .field("wallet_dir", &self.wallet_dir)
            .finish()
    }
}
