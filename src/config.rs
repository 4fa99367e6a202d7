//! Resource configuration files.
//!
//! A file holds the declared attributes of one network in YAML or JSON. The
//! private key may be given inline as `ssh_key` or by path as `ssh_key_file`.

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::resource::schema::{Attributes, SchemaError, NETWORK_SCHEMA};
use crate::types::NetworkConfig;

const KEY_FILE_FIELD: &str = "ssh_key_file";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Both ssh_key and ssh_key_file are set")]
    ConflictingKeys,

    #[error("Invalid configuration: {0}")]
    Schema(#[from] SchemaError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Reads the attribute map from a YAML or JSON file
pub fn load_attributes(path: &Path) -> Result<Attributes> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_attributes(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_attributes(content: &str) -> std::result::Result<Attributes, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Replaces `ssh_key_file` (or the `key_file` override) with the key it points at
pub fn resolve_key_file(attrs: &mut Attributes, key_file: Option<&Path>) -> Result<()> {
    let from_attrs = match attrs.remove(KEY_FILE_FIELD) {
        Some(Value::String(path)) => Some(expand_home(&path)),
        Some(Value::Null) | None => None,
        Some(_) => {
            return Err(SchemaError::InvalidType {
                field: KEY_FILE_FIELD.to_string(),
                expected: "string",
            }
            .into())
        }
    };

    let Some(path) = key_file.map(Path::to_path_buf).or(from_attrs) else {
        return Ok(());
    };

    if attrs.get("ssh_key").is_some_and(|v| !v.is_null()) {
        return Err(ConfigError::ConflictingKeys);
    }

    debug!("Reading private key from {}", path.display());
    let key = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
    attrs.insert("ssh_key".to_string(), Value::String(key));

    Ok(())
}

/// Loads, resolves and validates a network configuration file
pub fn load_network_config(path: &Path, key_file: Option<&Path>) -> Result<NetworkConfig> {
    let mut attrs = load_attributes(path)?;
    resolve_key_file(&mut attrs, key_file)?;

    debug!(
        "Loaded attributes from {}: {:?}",
        path.display(),
        NETWORK_SCHEMA.redact(&attrs)
    );

    Ok(NetworkConfig::from_attributes(&attrs)?)
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
