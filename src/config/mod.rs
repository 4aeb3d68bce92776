//! Configuration management
//!
//! This module resolves the two layered configuration files of the client:
//! the application config file (`config.toml`, sections `[sdk]` and
//! `[gateway]`) and the SDK-level config file (`config.yaml`) it points to.
//!
//! Resolution order (later wins):
//! 1. `[sdk]` section and the SDK-level file
//! 2. `[gateway]` section (channel and chaincode identifiers)
//! 3. Explicit overrides (config dir, user, log file)

pub mod resolver;
pub mod sdk;
pub mod settings;

pub use resolver::{
    ChaincodeSource, ConfigResolver, Configuration, DEFAULT_CONNECTION_FILE,
    DEFAULT_SDK_CONFIG_FILE,
};
pub use sdk::{load_sdk_profile, strip_extension, SdkProfile};
pub use settings::{load_app_config, GatewaySection, RawAppConfig, SdkSection};
