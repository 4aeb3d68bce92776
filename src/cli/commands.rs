use crate::client::ClientOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fabric-client")]
pub struct Opt {
    #[arg(
        long,
        default_value = "config",
        help = "Base name of the config file (without extension)"
    )]
    pub config: String,
    #[arg(long, default_value = ".", help = "Directory holding the config file")]
    pub path: PathBuf,
    #[arg(long, help = "Override the config dir of the config file")]
    pub dir: Option<PathBuf>,
    #[arg(long, help = "Operate as USER regardless of the config file")]
    pub user: Option<String>,
    #[arg(long, help = "Wallet directory (default: <config dir>/wallet)")]
    pub wallet: Option<PathBuf>,
    #[arg(long, help = "Log file (default: bc.log)")]
    pub log: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

impl Opt {
    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::new();
        if let Some(user) = &self.user {
            options = options.with_user(user.clone());
        }
        if let Some(wallet) = &self.wallet {
            options = options.with_wallet(wallet.clone());
        }
        if let Some(log) = &self.log {
            options = options.with_log(log.clone());
        }
        if let Some(dir) = &self.dir {
            options = options.with_config_dir(dir.clone());
        }
        options
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "showconfig", about = "Resolve and print the configuration")]
    ShowConfig,
    #[command(name = "listidentities", about = "Print the identities in the wallet")]
    ListIdentities,
    #[command(
        name = "importidentity",
        about = "Store an existing X.509 certificate and key in the wallet"
    )]
    ImportIdentity {
        #[arg(help = "Wallet label of the identity")]
        label: String,
        #[arg(long = "msp-id", help = "MSP ID of the identity's organization")]
        msp_id: Option<String>,
        #[arg(long, help = "PEM certificate file")]
        cert: PathBuf,
        #[arg(long, help = "PEM private key file")]
        key: PathBuf,
    },
    #[command(name = "removeidentity", about = "Remove an identity from the wallet")]
    RemoveIdentity {
        #[arg(help = "Wallet label of the identity")]
        label: String,
    },
}
