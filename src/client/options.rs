use crate::config::{ConfigResolver, Configuration};
use std::path::PathBuf;

/// Name of the wallet directory under the config dir.
pub const DEFAULT_WALLET_DIR: &str = "wallet";

/// Overrides applied on top of the config files when creating a [`Client`].
///
/// Each setter is independent of the others; setting the same option twice
/// keeps the last value.
///
/// [`Client`]: crate::client::Client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    user: Option<String>,
    wallet_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    config_dir: Option<PathBuf>,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operate as `name` regardless of the user in the config file.
    pub fn with_user(mut self, name: impl Into<String>) -> Self {
        self.user = Some(name.into());
        self
    }

    /// Keep the wallet in `dir` instead of `<config dir>/wallet`.
    pub fn with_wallet(mut self, dir: impl Into<PathBuf>) -> Self {
        self.wallet_dir = Some(dir.into());
        self
    }

    /// Log to `path` instead of the file named by the config file.
    pub fn with_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Use `dir` as config dir, ignoring the `dir` fields of the config file.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Resolver carrying these overrides.
    pub fn resolver(&self) -> ConfigResolver {
        let mut resolver = ConfigResolver::new();
        if let Some(user) = &self.user {
            resolver = resolver.with_user(user.clone());
        }
        if let Some(log_file) = &self.log_file {
            resolver = resolver.with_log_file(log_file.clone());
        }
        if let Some(dir) = &self.config_dir {
            resolver = resolver.with_config_dir(dir.clone());
        }
        resolver
    }

    /// The wallet directory to use for `config`.
    pub fn wallet_dir_for(&self, config: &Configuration) -> PathBuf {
        self.wallet_dir
            .clone()
            .unwrap_or_else(|| config.config_dir.join(DEFAULT_WALLET_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawAppConfig;
    use std::path::Path;

    fn configuration(options: &ClientOptions) -> Configuration {
        let raw = RawAppConfig::from_toml_str(
            "[gateway]\ndir = \"/etc/app\"\nConnection = \"\"\nUser = \"appUser\"\nChannelID = \"c\"\nChaincodeID = \"cc\"",
        )
        .unwrap();
        options
            .resolver()
            .resolve_with(Path::new("config.toml"), &raw, |_| Ok(None))
            .unwrap()
    }

    #[test]
    fn test_defaults_keep_file_values() {
        let options = ClientOptions::new();
        let config = configuration(&options);
        assert_eq!(config.user, "appUser");
        assert_eq!(
            options.wallet_dir_for(&config),
            PathBuf::from("/etc/app/wallet")
        );
    }

    #[test]
    fn test_later_setting_wins() {
        let options = ClientOptions::new().with_user("Mary").with_user("Bob");
        assert_eq!(options.user(), Some("Bob"));
        assert_eq!(configuration(&options).user, "Bob");
    }

    #[test]
    fn test_options_are_independent() {
        let a = ClientOptions::new()
            .with_wallet("/var/wallet")
            .with_log("client.log");
        let b = ClientOptions::new()
            .with_log("client.log")
            .with_wallet("/var/wallet");
        assert_eq!(a, b);

        let config = configuration(&a);
        assert_eq!(a.wallet_dir_for(&config), PathBuf::from("/var/wallet"));
        assert_eq!(config.log_file, Some(PathBuf::from("client.log")));
        assert_eq!(config.user, "appUser");
    }

    #[test]
    fn test_config_dir_moves_wallet_default() {
        let options = ClientOptions::new().with_config_dir("/srv/fabric");
        let config = configuration(&options);
        assert_eq!(
            options.wallet_dir_for(&config),
            PathBuf::from("/srv/fabric/wallet")
        );
    }
}
