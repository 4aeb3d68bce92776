//! Logging bootstrap
//!
//! The library logs through the `log` facade only. The binary installs an
//! `env_logger` backend once at start-up, writing to the log file named by the
//! config file (or the `--log` override) and falling back to stderr.

use crate::config::Configuration;
use crate::error::{ClientError, Result};
use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Log file used when neither the config file nor an option names one.
pub const DEFAULT_LOG_FILE: &str = "bc.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub debug: bool,
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            debug: false,
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl LogSettings {
    pub fn from_configuration(config: &Configuration) -> Self {
        Self {
            debug: config.debug,
            file: config
                .log_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }

    pub fn level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

/// Install the process logger. `RUST_LOG` still overrides the level.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let mut builder = Builder::new();
    builder.filter_level(settings.level()).parse_default_env();

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.file);
    let to_file = match file {
        Ok(file) => {
            builder
                .target(Target::Pipe(Box::new(file)))
                .write_style(WriteStyle::Never);
            true
        }
        Err(_) => false,
    };

    builder
        .try_init()
        .map_err(|e| ClientError::Logging(e.to_string()))?;

    if !to_file {
        log::info!(
            "Failed to log to file {}, using default stderr",
            settings.file.display()
        );
    }
    if settings.debug {
        log::info!("Log in debug mode");
    } else {
        log::info!("Log in info mode");
    }
    log::info!("fabric-gateway-client version {}", crate::VERSION);
    Ok(())
}
