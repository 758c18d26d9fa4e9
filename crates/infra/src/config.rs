//! Configuration loaded from environment variables.
//!
//! | Variable | Values | Default |
//! |---|---|---|
//! | `INNKEEP_STORAGE` | `memory`, `file` | `memory` |
//! | `INNKEEP_DATA_DIR` | directory path | `./data` |
//! | `INNKEEP_EXPIRY_WARNING_DAYS` | non-negative integer | `7` |
//! | `INNKEEP_SEED` | `true`, `false` | `true` |

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_EXPIRY_WARNING_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage: StorageKind,
    pub data_dir: PathBuf,
    pub expiry_warning_days: u32,
    /// Fill missing collections with the demo dataset.
    pub seed: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}' (expected {expected})")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageKind::Memory,
            data_dir: PathBuf::from("./data"),
            expiry_warning_days: DEFAULT_EXPIRY_WARNING_DAYS,
            seed: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Unset or blank variables take their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let storage = match get("INNKEEP_STORAGE") {
            None => defaults.storage,
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "memory" => StorageKind::Memory,
                "file" => StorageKind::File,
                _ => return Err(invalid("INNKEEP_STORAGE", v, "memory or file")),
            },
        };

        let data_dir = get("INNKEEP_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir);

        let expiry_warning_days = match get("INNKEEP_EXPIRY_WARNING_DAYS") {
            None => defaults.expiry_warning_days,
            Some(v) => v
                .parse()
                .map_err(|_| invalid("INNKEEP_EXPIRY_WARNING_DAYS", v, "a non-negative integer"))?,
        };

        let seed = match get("INNKEEP_SEED") {
            None => defaults.seed,
            Some(v) => v
                .to_ascii_lowercase()
                .parse()
                .map_err(|_| invalid("INNKEEP_SEED", v, "true or false"))?,
        };

        Ok(Self {
            storage,
            data_dir,
            expiry_warning_days,
            seed,
        })
    }
}

fn invalid(var: &'static str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::Invalid { var, value, expected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("INNKEEP_STORAGE", "File"),
            ("INNKEEP_DATA_DIR", "/var/lib/innkeep"),
            ("INNKEEP_EXPIRY_WARNING_DAYS", "14"),
            ("INNKEEP_SEED", "false"),
        ]))
        .unwrap();

        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/innkeep"));
        assert_eq!(config.expiry_warning_days, 14);
        assert!(!config.seed);
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = Config::from_lookup(lookup(&[("INNKEEP_EXPIRY_WARNING_DAYS", "-1")])).unwrap_err();
        assert!(err.to_string().contains("INNKEEP_EXPIRY_WARNING_DAYS"));

        assert!(Config::from_lookup(lookup(&[("INNKEEP_STORAGE", "redis")])).is_err());
        assert!(Config::from_lookup(lookup(&[("INNKEEP_SEED", "yes")])).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[("INNKEEP_STORAGE", "  ")])).unwrap();
        assert_eq!(config.storage, StorageKind::Memory);
    }
}
