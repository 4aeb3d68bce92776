// Entry point of the gateway client CLI.
// It resolves the configuration the same way a Client would, so the commands
// below show exactly what a client created from these files would use.
use clap::Parser;
use fabric_gateway_client::{
    init_logging, Command, ConfigError, Configuration, FileSystemWallet, IdentityWallet,
    LogSettings, Opt, X509Identity,
};
use log::error;
use std::{fs, process};

fn main() {
    let opt = Opt::parse();

    if let Err(e) = run(opt) {
        error!("Error: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let options = opt.client_options();

    // A missing SDK file is fine as long as the [gateway] section is complete
    let config = options
        .resolver()
        .resolve(&opt.config, &opt.path)
        .or_else(ConfigError::into_tolerated)?;

    init_logging(&LogSettings::from_configuration(&config))?;
    config.log_startup_summary();

    let wallet_dir = options.wallet_dir_for(&config);
    match opt.command {
        Command::ShowConfig => {
            println!("{config}");
            println!("wallet dir:        {}", wallet_dir.display());
        }
        Command::ListIdentities => {
            let wallet = FileSystemWallet::open(&wallet_dir)?;
            for label in wallet.list()? {
                let marker = if label == config.user { " (current user)" } else { "" };
                println!("{label}{marker}");
            }
        }
        Command::ImportIdentity {
            label,
            msp_id,
            cert,
            key,
        } => {
            let msp_id = import_msp_id(msp_id, &config)?;
            let certificate = fs::read_to_string(&cert)
                .map_err(|e| format!("could not read certificate {}: {e}", cert.display()))?;
            let private_key = fs::read_to_string(&key)
                .map_err(|e| format!("could not read private key {}: {e}", key.display()))?;

            let wallet = FileSystemWallet::open(&wallet_dir)?;
            wallet.put(&label, &X509Identity::new(msp_id, certificate, private_key))?;
            println!("Imported {label} into {}", wallet_dir.display());
        }
        Command::RemoveIdentity { label } => {
            let wallet = FileSystemWallet::open(&wallet_dir)?;
            wallet.remove(&label)?;
            println!("Removed {label}");
        }
    }
    Ok(())
}

// The MSP ID defaults to the peer organization of the SDK config file
fn import_msp_id(
    msp_id: Option<String>,
    config: &Configuration,
) -> Result<String, Box<dyn std::error::Error>> {
    match msp_id {
        Some(id) if !id.is_empty() => Ok(id),
        _ if !config.peer_org_msp_id.is_empty() => Ok(config.peer_org_msp_id.clone()),
        _ => Err("no --msp-id given and the SDK config file defines no MSP ID".into()),
    }
}
