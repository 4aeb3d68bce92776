//! Application config file (`config.toml`) with its [sdk] and [gateway] sections.
//!
//! Keys are folded to lowercase before typed deserialization, so
//! `ChannelID`, `channelId` and `channelid` all name the same field.

use crate::error::{BoxError, ConfigError};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions probed, in order, when the config file is named by base name.
pub const APP_CONFIG_EXTENSIONS: [&str; 3] = ["toml", "yaml", "yml"];

/// Parsed, unvalidated content of the application config file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RawAppConfig {
    #[serde(deserialize_with = "lenient_bool")]
    pub debug: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub log: Option<String>,
    pub sdk: SdkSection,
    pub gateway: GatewaySection,
}

/// The `[sdk]` section, used by the full SDK set-up.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SdkSection {
    #[serde(deserialize_with = "lenient_string")]
    pub dir: Option<String>,
    #[serde(rename = "channelid", deserialize_with = "lenient_string")]
    pub channel_id: Option<String>,
    #[serde(rename = "chaincodeid", deserialize_with = "lenient_string")]
    pub chaincode_id: Option<String>,
    #[serde(rename = "chaincodeversion", deserialize_with = "lenient_string")]
    pub chaincode_version: Option<String>,
    #[serde(rename = "chaincodepath", deserialize_with = "lenient_string")]
    pub chaincode_path: Option<String>,
    #[serde(rename = "chaincodepackage", deserialize_with = "lenient_string")]
    pub chaincode_package: Option<String>,
    #[serde(rename = "orgadmin", deserialize_with = "lenient_string")]
    pub org_admin: Option<String>,
    #[serde(rename = "ordererid", deserialize_with = "lenient_string")]
    pub orderer_id: Option<String>,
    #[serde(rename = "channelconfig", deserialize_with = "lenient_string")]
    pub channel_config: Option<String>,
    #[serde(rename = "configfile", deserialize_with = "lenient_string")]
    pub config_file: Option<String>,
}

/// The `[gateway]` section, used by the gateway client.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    #[serde(deserialize_with = "lenient_string")]
    pub dir: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub connection: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub user: Option<String>,
    #[serde(rename = "userpwd", deserialize_with = "lenient_string")]
    pub user_pwd: Option<String>,
    #[serde(rename = "channelid", deserialize_with = "lenient_string")]
    pub channel_id: Option<String>,
    #[serde(rename = "chaincodeid", deserialize_with = "lenient_string")]
    pub chaincode_id: Option<String>,
    #[serde(rename = "notlocal", deserialize_with = "lenient_bool")]
    pub not_local: bool,
}

/// Returns the trimmed value when it is set and not blank.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SdkSection {
    /// The section counts as defined when both identifiers are present.
    pub fn is_defined(&self) -> bool {
        non_empty(&self.channel_id).is_some() && non_empty(&self.chaincode_id).is_some()
    }
}

impl GatewaySection {
    /// The section counts as defined when it names a connection profile,
    /// even with an empty value that falls back to the default profile.
    pub fn is_defined(&self) -> bool {
        self.connection.is_some()
    }
}

impl RawAppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = text.parse()?;
        fold_toml_keys(toml::Value::Table(table)).try_into()
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        serde_yaml::from_value(fold_yaml_keys(value))
    }
}

/// Scalar values of any type are read as strings, so `ChaincodeVersion = 1.0`
/// reads as `"1.0"` and `User = 42` as `"42"`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringVisitor;

    impl<'de> Visitor<'de> for StringVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or boolean")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            // Keep the decimal point of whole numbers: 1.0 stays "1.0"
            if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
                Ok(Some(format!("{value:.1}")))
            } else {
                Ok(Some(value.to_string()))
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, inner: D2) -> Result<Self::Value, D2::Error> {
            inner.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(StringVisitor)
}

/// Booleans may also be written as strings (`"true"`, `"F"`, `"1"`, ...) or
/// numbers, where any non-zero number is true. A blank value is false.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct BoolVisitor;

    impl<'de> Visitor<'de> for BoolVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean, or a string or number convertible to one")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            match value.trim() {
                "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
                "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
                other => Err(de::Error::custom(format!(
                    "cannot read {other:?} as a boolean"
                ))),
            }
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(value != 0)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(value != 0)
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(value != 0.0)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(false)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(false)
        }

        fn visit_some<D2: Deserializer<'de>>(self, inner: D2) -> Result<Self::Value, D2::Error> {
            inner.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(BoolVisitor)
}

/// Locate and parse `<dir>/<base_name>.<ext>` for the first supported extension.
///
/// A `base_name` that already carries a supported extension is used as is.
pub fn load_app_config(
    base_name: &str,
    dir: &Path,
) -> Result<(PathBuf, RawAppConfig), ConfigError> {
    let path = locate(base_name, dir).ok_or_else(|| ConfigError::NotFound {
        base: base_name.to_string(),
        dir: dir.to_path_buf(),
    })?;
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    let parsed: Result<RawAppConfig, BoxError> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => RawAppConfig::from_yaml_str(&text).map_err(Into::into),
        _ => RawAppConfig::from_toml_str(&text).map_err(Into::into),
    };
    let raw = parsed.map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    log::debug!("read config file {}", path.display());
    Ok((path, raw))
}

fn locate(base_name: &str, dir: &Path) -> Option<PathBuf> {
    let direct = dir.join(base_name);
    let has_extension = direct
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| APP_CONFIG_EXTENSIONS.contains(&ext));
    if has_extension && direct.is_file() {
        return Some(direct);
    }

    APP_CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{base_name}.{ext}")))
        .find(|candidate| candidate.is_file())
}

fn fold_toml_keys(value: toml::Value) -> toml::Value {
    match value {
        toml::Value::Table(table) => toml::Value::Table(
            table
                .into_iter()
                .map(|(key, value)| (key.to_ascii_lowercase(), fold_toml_keys(value)))
                .collect(),
        ),
        toml::Value::Array(items) => {
            toml::Value::Array(items.into_iter().map(fold_toml_keys).collect())
        }
        other => other,
    }
}

/// Lowercase every string key of a YAML document, recursively.
pub(crate) fn fold_yaml_keys(value: serde_yaml::Value) -> serde_yaml::Value {
    use serde_yaml::Value;

    match value {
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .into_iter()
                .map(|(key, value)| {
                    let key = match key {
                        Value::String(s) => Value::String(s.to_ascii_lowercase()),
                        other => other,
                    };
                    (key, fold_yaml_keys(value))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(fold_yaml_keys).collect()),
        Value::Tagged(tagged) => fold_yaml_keys(tagged.value),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
debug = true
log = "client.log"

[sdk]
dir = "/etc/app"
ChannelID = "mychannel"
ChaincodeID = "fabcar"
ChaincodeVersion = "1.0"

[gateway]
Connection = "connection-org1.yaml"
User = "appUser"
notlocal = true
"#;

    #[test]
    fn test_keys_are_case_insensitive() {
        let raw = RawAppConfig::from_toml_str(SAMPLE).unwrap();
        assert!(raw.debug);
        assert_eq!(raw.log.as_deref(), Some("client.log"));
        assert_eq!(raw.sdk.channel_id.as_deref(), Some("mychannel"));
        assert_eq!(raw.sdk.chaincode_id.as_deref(), Some("fabcar"));
        assert_eq!(raw.sdk.chaincode_version.as_deref(), Some("1.0"));
        assert_eq!(raw.gateway.user.as_deref(), Some("appUser"));
        assert!(raw.gateway.not_local);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let raw = RawAppConfig::from_toml_str("debug = false").unwrap();
        assert!(!raw.sdk.is_defined());
        assert!(!raw.gateway.is_defined());
    }

    #[test]
    fn test_empty_connection_still_defines_gateway() {
        let raw = RawAppConfig::from_toml_str("[gateway]\nConnection = \"\"").unwrap();
        assert!(raw.gateway.is_defined());
        assert_eq!(non_empty(&raw.gateway.connection), None);
    }

    #[test]
    fn test_sdk_needs_both_identifiers() {
        let raw = RawAppConfig::from_toml_str("[sdk]\nChannelID = \"mychannel\"").unwrap();
        assert!(!raw.sdk.is_defined());
    }

    #[test]
    fn test_yaml_document_is_accepted() {
        let raw = RawAppConfig::from_yaml_str(
            "gateway:\n  Connection: connection.yaml\n  ChannelID: mychannel\n",
        )
        .unwrap();
        assert!(raw.gateway.is_defined());
        assert_eq!(raw.gateway.channel_id.as_deref(), Some("mychannel"));
    }

    #[test]
    fn test_load_by_base_name() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), SAMPLE).unwrap();

        let (path, raw) = load_app_config("config", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("config.toml"));
        assert!(raw.sdk.is_defined());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_app_config("config", dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "[sdk\nChannelID = ").unwrap();
        let err = load_app_config("config", dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_scalars_are_read_as_strings() {
        let raw = RawAppConfig::from_toml_str(
            "[sdk]\nChannelID = \"mychannel\"\nChaincodeID = \"fabcar\"\nChaincodeVersion = 1.0\n\n[gateway]\nConnection = \"\"\nUser = 42\n",
        )
        .unwrap();
        assert_eq!(raw.sdk.chaincode_version.as_deref(), Some("1.0"));
        assert_eq!(raw.gateway.user.as_deref(), Some("42"));

        let raw = RawAppConfig::from_yaml_str("sdk:\n  ChaincodeVersion: 2\n  ChannelID:\n").unwrap();
        assert_eq!(raw.sdk.chaincode_version.as_deref(), Some("2"));
        assert_eq!(raw.sdk.channel_id, None);
    }

    #[test]
    fn test_booleans_accept_strings_and_numbers() {
        let raw = RawAppConfig::from_toml_str(
            "debug = \"true\"\n[gateway]\nConnection = \"\"\nnotlocal = \"T\"\n",
        )
        .unwrap();
        assert!(raw.debug);
        assert!(raw.gateway.not_local);

        let raw = RawAppConfig::from_yaml_str("debug: \"false\"\ngateway:\n  notlocal: 1\n").unwrap();
        assert!(!raw.debug);
        assert!(raw.gateway.not_local);
    }

    #[test]
    fn test_unreadable_boolean_is_rejected() {
        let err = RawAppConfig::from_toml_str("debug = \"maybe\"").unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }
}
