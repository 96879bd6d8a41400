//! CLI configuration file (`--config <path>`, YAML).
//!
//! ```yaml
//! abi_dir: ./abi
//! strict: false
//! log:
//!   level: info
//!   json: false
//!   components:
//!     eoscodec-registry: debug
//! ```

use anyhow::{Context, Result};
use eoscodec_observability::LogConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub log: LogConfig,
    /// Directory of ABI-definition YAML files
    #[serde(default = "default_abi_dir")]
    pub abi_dir: PathBuf,
    /// Fail instead of dropping payloads with no registered layout
    #[serde(default)]
    pub strict: bool,
}

fn default_abi_dir() -> PathBuf {
    PathBuf::from("./abi")
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            abi_dir: default_abi_dir(),
            strict: false,
        }
    }
}

impl CliConfig {
    /// Load from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty file is a valid "all defaults" config.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CliConfig::from_yaml("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.abi_dir, PathBuf::from("./abi"));
        assert!(!config.strict);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn full_file() {
        let config = CliConfig::from_yaml(
            "abi_dir: /etc/eoscodec/abi\nstrict: true\nlog:\n  level: debug\n  json: true\n",
        )
        .unwrap();
        assert_eq!(config.abi_dir, PathBuf::from("/etc/eoscodec/abi"));
        assert!(config.strict);
        assert_eq!(config.log.level, "debug");
        assert!(config.log.json);
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(CliConfig::from_yaml("abi_directory: x\n").is_err());
    }
}
