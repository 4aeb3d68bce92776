//! SDK-level config file (`config.yaml`).
//!
//! Only the organization block is consumed here: the client organization, its
//! credential store and the MSP ID registered for it.

use crate::config::settings::fold_yaml_keys;
use crate::error::ConfigError;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Values read from the SDK-level config file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SdkProfile {
    pub org_name: String,
    pub credential_path: Option<PathBuf>,
    pub peer_org_msp_id: String,
}

/// Removes the extension `ext` from `name` if present.
///
/// A missing leading '.' is added to `ext`, and compound extensions such as
/// `tar.gz` are accepted.
pub fn strip_extension<'a>(name: &'a str, ext: &str) -> &'a str {
    if ext.is_empty() {
        return name;
    }
    let ext = ext.trim_start_matches('.');
    name.strip_suffix(ext)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(name)
}

impl SdkProfile {
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        let doc = fold_yaml_keys(serde_yaml::from_str(text)?);

        let org_name = lookup(&doc, &["client", "organization"])
            .and_then(scalar_string)
            .unwrap_or_default();
        let credential_path = lookup(&doc, &["client", "credentialstore", "path"])
            .and_then(scalar_string)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        let org_key = org_name.to_ascii_lowercase();
        let peer_org_msp_id = lookup(&doc, &["organizations", org_key.as_str(), "mspid"])
            .and_then(scalar_string)
            .unwrap_or_default();

        Ok(SdkProfile {
            org_name,
            credential_path,
            peer_org_msp_id,
        })
    }
}

/// Load the SDK profile for `config_file`.
///
/// The file is looked up by stem in its directory, so `config.yaml` also
/// matches `config.yml`. Returns `Ok(None)` when no candidate exists.
pub fn load_sdk_profile(config_file: &Path) -> Result<Option<SdkProfile>, ConfigError> {
    let Some(path) = candidates(config_file).into_iter().find(|p| p.is_file()) else {
        return Ok(None);
    };

    let text = fs::read_to_string(&path).map_err(|e| ConfigError::SecondaryLoad {
        path: path.clone(),
        source: e.into(),
    })?;
    let profile = SdkProfile::from_yaml_str(&text).map_err(|e| ConfigError::SecondaryLoad {
        path: path.clone(),
        source: e.into(),
    })?;
    log::debug!(
        "loaded SDK profile {} (organization {:?})",
        path.display(),
        profile.org_name
    );
    Ok(Some(profile))
}

fn candidates(config_file: &Path) -> Vec<PathBuf> {
    let mut paths = vec![config_file.to_path_buf()];
    let dir = config_file.parent().unwrap_or_else(|| Path::new(""));
    if let Some(name) = config_file.file_name().and_then(|n| n.to_str()) {
        let stem = strip_extension(name, "yaml");
        for ext in ["yaml", "yml"] {
            let path = dir.join(format!("{stem}.{ext}"));
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

fn lookup<'a>(doc: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(doc, |node, key| node.get(*key))
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
