use crate::config::sdk::{load_sdk_profile, SdkProfile};
use crate::config::settings::{load_app_config, non_empty, RawAppConfig};
use crate::error::{BoxError, ConfigError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Connection profile used when `[gateway] Connection` is empty.
pub const DEFAULT_CONNECTION_FILE: &str = "connection.yaml";
/// SDK config file used when `[sdk] ConfigFile` is empty.
pub const DEFAULT_SDK_CONFIG_FILE: &str = "config.yaml";

/// Fully resolved configuration, immutable once produced by [`ConfigResolver`].
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Absolute base directory of every relative path below.
    pub config_dir: PathBuf,
    /// Connection profile for the gateway. Set when the gateway section is.
    pub connection_file: Option<PathBuf>,
    /// SDK-level config file. Set when the sdk section is.
    pub sdk_config_file: Option<PathBuf>,
    pub channel_id: String,
    pub chaincode_id: String,
    pub user: String,
    pub user_secret: Option<String>,
    /// Auto-populated from the SDK config file.
    pub org_name: String,
    /// MSP ID of `org_name`, auto-populated from the SDK config file.
    pub peer_org_msp_id: String,
    /// User's key store, auto-populated from the SDK config file.
    pub credential_path: Option<PathBuf>,
    pub orderer_id: Option<String>,
    pub channel_config: Option<String>,
    pub chaincode_version: Option<String>,
    pub chaincode_path: Option<String>,
    pub chaincode_package: Option<String>,
    pub org_admin: Option<String>,
    /// False when the peers run in a local docker network.
    pub gateway_not_local: bool,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    sdk_defined: bool,
    gateway_defined: bool,
}

/// Where the chaincode to install comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaincodeSource<'a> {
    Path(&'a str),
    Package(&'a str),
}

impl Configuration {
    fn new(config_dir: PathBuf, sdk_defined: bool, gateway_defined: bool) -> Self {
        Configuration {
            config_dir,
            connection_file: None,
            sdk_config_file: None,
            channel_id: String::new(),
            chaincode_id: String::new(),
            user: String::new(),
            user_secret: None,
            org_name: String::new(),
            peer_org_msp_id: String::new(),
            credential_path: None,
            orderer_id: None,
            channel_config: None,
            chaincode_version: None,
            chaincode_path: None,
            chaincode_package: None,
            org_admin: None,
            gateway_not_local: false,
            debug: false,
            log_file: None,
            sdk_defined,
            gateway_defined,
        }
    }

    /// True when the `[sdk]` section defines both ChannelID and ChaincodeID.
    pub fn sdk_defined(&self) -> bool {
        self.sdk_defined
    }

    /// True when the `[gateway]` section names a connection profile.
    pub fn gateway_defined(&self) -> bool {
        self.gateway_defined
    }

    /// Peers are reached through localhost when the gateway runs next to a
    /// local docker network.
    pub fn discovery_as_localhost(&self) -> bool {
        !self.gateway_not_local
    }

    /// Exactly one of ChaincodePath and ChaincodePackage must be set.
    pub fn chaincode_source(&self) -> Result<ChaincodeSource<'_>, ConfigError> {
        match (
            non_empty(&self.chaincode_path),
            non_empty(&self.chaincode_package),
        ) {
            (Some(path), None) => Ok(ChaincodeSource::Path(path)),
            (None, Some(package)) => Ok(ChaincodeSource::Package(package)),
            _ => Err(ConfigError::ChaincodeSource),
        }
    }

    pub fn log_startup_summary(&self) {
        log::info!(
            "resolved configuration: dir={} channel={} chaincode={} user={} org={} msp={} gateway={} sdk={} local={}",
            self.config_dir.display(),
            self.channel_id,
            self.chaincode_id,
            self.user,
            self.org_name,
            self.peer_org_msp_id,
            self.gateway_defined,
            self.sdk_defined,
            self.discovery_as_localhost(),
        );
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("config_dir", &self.config_dir)
            .field("connection_file", &self.connection_file)
            .field("sdk_config_file", &self.sdk_config_file)
            .field("channel_id", &self.channel_id)
            .field("chaincode_id", &self.chaincode_id)
            .field("user", &self.user)
            .field("user_secret", &self.user_secret.as_ref().map(|_| "<redacted>"))
            .field("org_name", &self.org_name)
            .field("peer_org_msp_id", &self.peer_org_msp_id)
            .field("credential_path", &self.credential_path)
            .field("orderer_id", &self.orderer_id)
            .field("channel_config", &self.channel_config)
            .field("chaincode_version", &self.chaincode_version)
            .field("chaincode_path", &self.chaincode_path)
            .field("chaincode_package", &self.chaincode_package)
            .field("org_admin", &self.org_admin)
            .field("gateway_not_local", &self.gateway_not_local)
            .field("debug", &self.debug)
            .field("log_file", &self.log_file)
            .field("sdk_defined", &self.sdk_defined)
            .field("gateway_defined", &self.gateway_defined)
            .finish()
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt_path(path: &Option<PathBuf>) -> String {
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        }
        fn opt_str(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("-")
        }

        writeln!(f, "config dir:        {}", self.config_dir.display())?;
        writeln!(f, "connection file:   {}", opt_path(&self.connection_file))?;
        writeln!(f, "sdk config file:   {}", opt_path(&self.sdk_config_file))?;
        writeln!(f, "channel:           {}", self.channel_id)?;
        writeln!(f, "chaincode:         {}", self.chaincode_id)?;
        writeln!(f, "chaincode version: {}", opt_str(&self.chaincode_version))?;
        writeln!(f, "user:              {}", self.user)?;
        writeln!(
            f,
            "user secret:       {}",
            if self.user_secret.is_some() { "<set>" } else { "-" }
        )?;
        writeln!(f, "organization:      {}", self.org_name)?;
        writeln!(f, "peer org MSP:      {}", self.peer_org_msp_id)?;
        writeln!(f, "credential path:   {}", opt_path(&self.credential_path))?;
        writeln!(f, "orderer:           {}", opt_str(&self.orderer_id))?;
        writeln!(f, "org admin:         {}", opt_str(&self.org_admin))?;
        write!(f, "local discovery:   {}", self.discovery_as_localhost())
    }
}

/// Merges the `[gateway]` and `[sdk]` sections of the application config file
/// with the SDK-level config file into one [`Configuration`].
///
/// The gateway section takes precedence over the sdk section for the channel
/// and chaincode identifiers. Overrides set on the resolver win over both.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    base_dir: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    user: Option<String>,
    log_file: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor for a relative `dir`. Defaults to the running executable's
    /// directory, which a relative anchor is itself joined onto.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Use `dir` instead of the `dir` fields of the config file.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Operate as `user` regardless of the config file.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Resolve the config file `<search_dir>/<base_name>.{toml,yaml,yml}`.
    pub fn resolve(&self, base_name: &str, search_dir: &Path) -> Result<Configuration, ConfigError> {
        let (path, raw) = load_app_config(base_name, search_dir)?;
        self.resolve_raw(&path, &raw)
    }

    /// Resolve an already parsed config file, loading the SDK profile from disk.
    pub fn resolve_raw(&self, source: &Path, raw: &RawAppConfig) -> Result<Configuration, ConfigError> {
        self.resolve_with(source, raw, load_sdk_profile)
    }

    /// Resolve with a custom SDK profile loader.
    ///
    /// `load_profile` receives the SDK config file path and returns `Ok(None)`
    /// when that file does not exist.
    pub fn resolve_with<F>(
        &self,
        source: &Path,
        raw: &RawAppConfig,
        load_profile: F,
    ) -> Result<Configuration, ConfigError>
    where
        F: FnOnce(&Path) -> Result<Option<SdkProfile>, ConfigError>,
    {
        let sdk_defined = raw.sdk.is_defined();
        let gateway_defined = raw.gateway.is_defined();
        if !sdk_defined && !gateway_defined {
            log::error!(
                "configuration file {} misses important data in [sdk] and/or [gateway] sections",
                source.display()
            );
            return Err(ConfigError::MissingSections {
                path: source.to_path_buf(),
            });
        }

        let config_dir = self.config_dir(source, raw)?;
        let mut config = Configuration::new(config_dir, sdk_defined, gateway_defined);
        config.debug = raw.debug;
        config.log_file = non_empty(&raw.log).map(PathBuf::from);

        if gateway_defined {
            let gateway = &raw.gateway;
            let profile = non_empty(&gateway.connection).unwrap_or(DEFAULT_CONNECTION_FILE);
            config.connection_file = Some(config.config_dir.join(profile));
            config.user = non_empty(&gateway.user).unwrap_or_default().to_string();
            config.user_secret = non_empty(&gateway.user_pwd).map(str::to_string);
            config.channel_id = non_empty(&gateway.channel_id).unwrap_or_default().to_string();
            config.chaincode_id = non_empty(&gateway.chaincode_id)
                .unwrap_or_default()
                .to_string();
            config.gateway_not_local = gateway.not_local;
        }

        let mut missing_profile = None;
        if sdk_defined {
            let sdk = &raw.sdk;
            if config.channel_id.is_empty() {
                config.channel_id = non_empty(&sdk.channel_id).unwrap_or_default().to_string();
            }
            if config.chaincode_id.is_empty() {
                config.chaincode_id = non_empty(&sdk.chaincode_id)
                    .unwrap_or_default()
                    .to_string();
            }
            config.orderer_id = non_empty(&sdk.orderer_id).map(str::to_string);
            config.channel_config = non_empty(&sdk.channel_config).map(str::to_string);
            config.chaincode_version = non_empty(&sdk.chaincode_version).map(str::to_string);
            config.chaincode_path = non_empty(&sdk.chaincode_path).map(str::to_string);
            config.chaincode_package = non_empty(&sdk.chaincode_package).map(str::to_string);
            config.org_admin = non_empty(&sdk.org_admin).map(str::to_string);

            let file = non_empty(&sdk.config_file).unwrap_or(DEFAULT_SDK_CONFIG_FILE);
            let sdk_file = config.config_dir.join(file);
            log::debug!(
                "select files: configFile={} key={}",
                sdk_file.display(),
                config.config_dir.join("store").join("store.key").display()
            );

            match load_profile(&sdk_file)? {
                Some(profile) => {
                    config.org_name = profile.org_name;
                    config.credential_path = profile.credential_path;
                    config.peer_org_msp_id = profile.peer_org_msp_id;
                }
                None if gateway_defined => missing_profile = Some(sdk_file.clone()),
                None => {
                    log::error!("could not read SDK configuration file {}", sdk_file.display());
                    let source: BoxError = "file not found".into();
                    return Err(ConfigError::SecondaryLoad {
                        path: sdk_file,
                        source,
                    });
                }
            }
            config.sdk_config_file = Some(sdk_file);
        }

        if let Some(user) = self.user.as_deref().filter(|u| !u.is_empty()) {
            config.user = user.to_string();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = Some(log_file.clone());
        }

        if config.channel_id.is_empty() {
            return Err(ConfigError::MissingIdentifier {
                path: source.to_path_buf(),
                field: "ChannelID",
            });
        }
        if config.chaincode_id.is_empty() {
            return Err(ConfigError::MissingIdentifier {
                path: source.to_path_buf(),
                field: "ChaincodeID",
            });
        }

        match missing_profile {
            Some(path) => Err(ConfigError::NoSecondarySource {
                path,
                config: Box::new(config),
            }),
            None => Ok(config),
        }
    }

    fn config_dir(&self, source: &Path, raw: &RawAppConfig) -> Result<PathBuf, ConfigError> {
        let explicit = self
            .config_dir
            .as_ref()
            .filter(|dir| !dir.as_os_str().is_empty());
        let dir = match explicit {
            Some(dir) => dir.clone(),
            None => non_empty(&raw.gateway.dir)
                .or_else(|| non_empty(&raw.sdk.dir))
                .map(PathBuf::from)
                .ok_or_else(|| {
                    log::error!("configuration file {} misses the field dir", source.display());
                    ConfigError::MissingDir {
                        path: source.to_path_buf(),
                    }
                })?,
        };

        if dir.is_absolute() {
            return Ok(dir);
        }
        let base = match &self.base_dir {
            Some(base) if base.is_absolute() => base.clone(),
            Some(base) => executable_dir()?.join(base),
            None => executable_dir()?,
        };
        Ok(base.join(dir))
    }
}

impl ConfigError {
    /// Hand back the configuration of a [`ConfigError::NoSecondarySource`],
    /// which callers may go on with. Every other error is returned unchanged.
    pub fn into_tolerated(self) -> Result<Configuration, ConfigError> {
        match self {
            ConfigError::NoSecondarySource { path, config } => {
                log::warn!(
                    "no SDK configuration file at {}; continuing with the [gateway] section",
                    path.display()
                );
                Ok(*config)
            }
            other => Err(other),
        }
    }
}

fn executable_dir() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe().map_err(|source| ConfigError::Executable { source })?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::Executable {
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} has no parent directory", exe.display()),
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawAppConfig {
        RawAppConfig::from_toml_str(text).unwrap()
    }

    fn org1() -> Result<Option<SdkProfile>, ConfigError> {
        Ok(Some(SdkProfile {
            org_name: "Org1".to_string(),
            credential_path: Some(PathBuf::from("/tmp/state-store")),
            peer_org_msp_id: "Org1MSP".to_string(),
        }))
    }

    fn resolve(text: &str) -> Result<Configuration, ConfigError> {
        ConfigResolver::new()
            .with_base_dir("/opt/app/bin")
            .resolve_with(Path::new("config.toml"), &raw(text), |_| org1())
    }

    const FULL: &str = r#"
[sdk]
dir = "/etc/sdk"
ChannelID = "sdkchannel"
ChaincodeID = "sdkcc"
OrdererID = "orderer.example.com"
ChaincodePath = "github.com/fabcar"

[gateway]
dir = "/etc/app"
Connection = "connection-org1.yaml"
User = "appUser"
UserPwd = "s3cret"
ChannelID = "mychannel"
ChaincodeID = "fabcar"
"#;

    #[test]
    fn test_gateway_identifiers_take_precedence() {
        let config = resolve(FULL).unwrap();
        assert_eq!(config.channel_id, "mychannel");
        assert_eq!(config.chaincode_id, "fabcar");
        assert!(config.sdk_defined());
        assert!(config.gateway_defined());
    }

    #[test]
    fn test_full_resolution_populates_derived_fields() {
        let config = resolve(FULL).unwrap();
        assert_eq!(config.config_dir, PathBuf::from("/etc/app"));
        assert_eq!(
            config.connection_file,
            Some(PathBuf::from("/etc/app/connection-org1.yaml"))
        );
        assert_eq!(
            config.sdk_config_file,
            Some(PathBuf::from("/etc/app/config.yaml"))
        );
        assert_eq!(config.user, "appUser");
        assert_eq!(config.user_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.org_name, "Org1");
        assert_eq!(config.peer_org_msp_id, "Org1MSP");
        assert_eq!(config.orderer_id.as_deref(), Some("orderer.example.com"));
        assert_eq!(
            config.chaincode_source().unwrap(),
            ChaincodeSource::Path("github.com/fabcar")
        );
    }

    #[test]
    fn test_empty_connection_defaults_profile() {
        let config = resolve(
            r#"
[sdk]
dir = "/etc/app"

[gateway]
Connection = ""
ChannelID = "mychannel"
ChaincodeID = "fabcar"
"#,
        )
        .unwrap();
        assert_eq!(
            config.connection_file,
            Some(PathBuf::from("/etc/app/connection.yaml"))
        );
        assert_eq!(config.channel_id, "mychannel");
        assert!(!config.sdk_defined());
        assert_eq!(config.sdk_config_file, None);
    }

    #[test]
    fn test_sdk_only_resolves_without_gateway() {
        let config = resolve(
            r#"
[sdk]
dir = "/etc/app"
ChannelID = "mychannel"
ChaincodeID = "fabcar"
"#,
        )
        .unwrap();
        assert!(!config.gateway_defined());
        assert!(config.sdk_defined());
        assert_eq!(config.channel_id, "mychannel");
        assert_eq!(config.chaincode_id, "fabcar");
        assert_eq!(config.connection_file, None);
        assert_eq!(config.peer_org_msp_id, "Org1MSP");
    }

    #[test]
    fn test_user_override_wins() {
        for text in [
            FULL,
            "[sdk]\ndir = \"/etc/app\"\nChannelID = \"c\"\nChaincodeID = \"cc\"",
        ] {
            let config = ConfigResolver::new()
                .with_user("Mary")
                .resolve_with(Path::new("config.toml"), &raw(text), |_| org1())
                .unwrap();
            assert_eq!(config.user, "Mary");
        }
    }

    #[test]
    fn test_relative_dir_is_anchored_on_base() {
        let config = resolve(
            "[gateway]\ndir = \"../config\"\nConnection = \"c.yaml\"\nChannelID = \"c\"\nChaincodeID = \"cc\"",
        )
        .unwrap();
        assert!(config.config_dir.is_absolute());
        assert_eq!(config.config_dir, PathBuf::from("/opt/app/bin/../config"));
    }

    #[test]
    fn test_relative_dir_defaults_to_executable_dir() {
        let config = ConfigResolver::new()
            .resolve_with(
                Path::new("config.toml"),
                &raw("[gateway]\ndir = \"config\"\nConnection = \"\"\nChannelID = \"c\"\nChaincodeID = \"cc\""),
                |_| org1(),
            )
            .unwrap();
        assert!(config.config_dir.is_absolute());
        assert!(config.config_dir.ends_with("config"));
    }

    #[test]
    fn test_explicit_config_dir_override() {
        let config = ConfigResolver::new()
            .with_config_dir("/srv/fabric")
            .resolve_with(Path::new("config.toml"), &raw(FULL), |_| org1())
            .unwrap();
        assert_eq!(config.config_dir, PathBuf::from("/srv/fabric"));
        assert_eq!(
            config.connection_file,
            Some(PathBuf::from("/srv/fabric/connection-org1.yaml"))
        );
    }

    #[test]
    fn test_gateway_dir_before_sdk_dir() {
        let config = resolve(FULL).unwrap();
        assert_eq!(config.config_dir, PathBuf::from("/etc/app"));

        let config = resolve(
            "[sdk]\ndir = \"/etc/sdk\"\nChannelID = \"c\"\nChaincodeID = \"cc\"",
        )
        .unwrap();
        assert_eq!(config.config_dir, PathBuf::from("/etc/sdk"));
    }

    #[test]
    fn test_no_sections_fails_closed() {
        let err = resolve("debug = true\n[sdk]\ndir = \"/etc/app\"\nChannelID = \"c\"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSections { .. }));
    }

    #[test]
    fn test_missing_dir() {
        let err = resolve("[gateway]\nConnection = \"\"\nChannelID = \"c\"\nChaincodeID = \"cc\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingDir { .. }));
    }

    #[test]
    fn test_gateway_without_identifiers_is_rejected() {
        let err = resolve("[gateway]\ndir = \"/etc/app\"\nConnection = \"\"").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingIdentifier {
                field: "ChannelID",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_profile_is_soft_when_gateway_defined() {
        let err = ConfigResolver::new()
            .resolve_with(Path::new("config.toml"), &raw(FULL), |_| Ok(None))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoSecondarySource { .. }));

        let config = err.into_tolerated().unwrap();
        assert_eq!(config.channel_id, "mychannel");
        assert!(config.org_name.is_empty());
    }

    #[test]
    fn test_missing_profile_is_hard_for_sdk_only() {
        let err = ConfigResolver::new()
            .resolve_with(
                Path::new("config.toml"),
                &raw("[sdk]\ndir = \"/etc/app\"\nChannelID = \"c\"\nChaincodeID = \"cc\""),
                |_| Ok(None),
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::SecondaryLoad { .. }));
        assert!(err.into_tolerated().is_err());
    }

    #[test]
    fn test_custom_sdk_config_file() {
        let mut seen = None;
        ConfigResolver::new()
            .resolve_with(
                Path::new("config.toml"),
                &raw("[sdk]\ndir = \"/etc/app\"\nChannelID = \"c\"\nChaincodeID = \"cc\"\nConfigFile = \"sdk/network.yaml\""),
                |path| {
                    seen = Some(path.to_path_buf());
                    org1()
                },
            )
            .unwrap();
        assert_eq!(seen, Some(PathBuf::from("/etc/app/sdk/network.yaml")));
    }

    #[test]
    fn test_chaincode_source_ambiguity() {
        let mut config = resolve(FULL).unwrap();
        config.chaincode_package = Some("fabcar.tar.gz".to_string());
        assert!(matches!(
            config.chaincode_source(),
            Err(ConfigError::ChaincodeSource)
        ));
        config.chaincode_path = None;
        assert_eq!(
            config.chaincode_source().unwrap(),
            ChaincodeSource::Package("fabcar.tar.gz")
        );
    }

    #[test]
    fn test_discovery_follows_notlocal() {
        let config = resolve(FULL).unwrap();
        assert!(config.discovery_as_localhost());

        let config = resolve(&FULL.replace("UserPwd", "notlocal = true\nUserPwd")).unwrap();
        assert!(!config.discovery_as_localhost());
    }

    #[test]
    fn test_relative_base_dir_still_yields_absolute_dir() {
        let config = ConfigResolver::new()
            .with_base_dir("rel")
            .resolve_with(
                Path::new("config.toml"),
                &raw("[gateway]\ndir = \"cfg\"\nConnection = \"\"\nChannelID = \"c\"\nChaincodeID = \"cc\""),
                |_| org1(),
            )
            .unwrap();
        assert!(config.config_dir.is_absolute());
        assert!(config.config_dir.ends_with("rel/cfg"));
    }

    #[test]
    fn test_user_secret_is_redacted_in_debug() {
        let config = resolve(FULL).unwrap();
        assert_eq!(config.user_secret.as_deref(), Some("s3cret"));

        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));

        let err = ConfigError::NoSecondarySource {
            path: PathBuf::from("/etc/sdk/config.yaml"),
            config: Box::new(config),
        };
        assert!(!format!("{err:?}").contains("s3cret"));
    }
}
